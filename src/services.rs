//! Wiring of the loader and the enabled services from a list of modules.

use std::sync::{Arc, LazyLock};

use crate::auth::{AuthError, AuthSession};
use crate::bootstrap::{BootstrapResult, SdkInitParams, SdkLoader};
use crate::bridge::{BridgeError, BridgeGateway, EntryPointError, RetryPolicy};
use crate::host::{self, EntryPoints};
use crate::logger::Logger;
use crate::store::DocumentStore;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@firebase-bridge/services"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServicesError {
    /// Another live auth session or document store already owns its entry point.
    AlreadyRegistered(EntryPointError),
    Auth(AuthError),
    /// The entry points could not be installed on the host object.
    Install(BridgeError),
}

impl std::fmt::Display for ServicesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServicesError::AlreadyRegistered(err) => write!(f, "{err}"),
            ServicesError::Auth(err) => write!(f, "{err}"),
            ServicesError::Install(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ServicesError {}

impl From<AuthError> for ServicesError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AlreadyRegistered(err) => ServicesError::AlreadyRegistered(err),
            other => ServicesError::Auth(other),
        }
    }
}

impl From<EntryPointError> for ServicesError {
    fn from(err: EntryPointError) -> Self {
        ServicesError::AlreadyRegistered(err)
    }
}

/// The loader plus whichever services the init parameters enable.
#[derive(Debug, Clone)]
pub struct FirebaseServices {
    pub loader: Arc<SdkLoader>,
    pub auth: Option<Arc<AuthSession>>,
    pub store: Option<Arc<DocumentStore>>,
}

impl FirebaseServices {
    /// Services talking to the page's script context, registered on the global entry
    /// points, which are installed as well.
    #[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
    pub fn web(params: SdkInitParams) -> Result<Self, ServicesError> {
        host::install().map_err(ServicesError::Install)?;
        Self::builder(BridgeGateway::web(), params).build()
    }

    pub fn builder(gateway: BridgeGateway, params: SdkInitParams) -> FirebaseServicesBuilder {
        FirebaseServicesBuilder {
            gateway,
            params,
            policy: RetryPolicy::default(),
            entry_points: None,
            loader: None,
        }
    }

    /// Runs the bootstrap sequence now instead of on first use.
    pub async fn ensure_loaded(&self) -> BootstrapResult<()> {
        self.loader.ensure_loaded().await
    }
}

pub struct FirebaseServicesBuilder {
    gateway: BridgeGateway,
    params: SdkInitParams,
    policy: RetryPolicy,
    entry_points: Option<Arc<EntryPoints>>,
    loader: Option<SdkLoader>,
}

impl FirebaseServicesBuilder {
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn entry_points(mut self, entry_points: Arc<EntryPoints>) -> Self {
        self.entry_points = Some(entry_points);
        self
    }

    /// Replaces the default loader, for example to change its config source.
    ///
    /// The loader's own init parameters are the ones sent to the script side, so
    /// they also decide which services are built. A mismatch with the builder's
    /// parameters is logged.
    pub fn loader(mut self, loader: SdkLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn build(self) -> Result<FirebaseServices, ServicesError> {
        let entry_points = self.entry_points.unwrap_or_else(host::entry_points);
        let loader = Arc::new(match self.loader {
            Some(loader) => {
                if loader.params() != &self.params {
                    LOGGER.warn(format!(
                        "Loader init parameters differ from the builder's, using the loader's ({})",
                        loader.params().firebase_project_id
                    ));
                }
                loader
            }
            None => {
                SdkLoader::new(self.gateway.clone(), self.params).with_retry_policy(self.policy)
            }
        });
        let use_auth = loader.params().use_auth_module;
        let use_store = loader.params().use_store_module;

        let auth = if use_auth {
            Some(
                AuthSession::builder(self.gateway.clone(), loader.clone())
                    .retry_policy(self.policy)
                    .entry_points(entry_points.clone())
                    .build()?,
            )
        } else {
            None
        };

        let store = if use_store {
            Some(DocumentStore::with_entry_points(
                self.gateway,
                loader.clone(),
                entry_points,
            )?)
        } else {
            None
        };

        Ok(FirebaseServices {
            loader,
            auth,
            store,
        })
    }
}
