use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_lock::Mutex as AsyncMutex;
use serde_json::Value;

use crate::auth::error::AuthResult;
use crate::auth::principal::Principal;
use crate::auth::types::{AuthOperationResult, User};
use crate::auth::LOGGER;
use crate::bootstrap::SdkLoader;
use crate::bridge::{BridgeGateway, RetryPolicy, HOST_MODULE};
use crate::host::{self, EntryPoints, AUTH_STATE_CALLBACK};
use crate::marshal::{parse_auth_result, parse_user};
use crate::platform::runtime::spawn_detached;
use crate::util::{ListenerList, Unsubscribe};

pub const REGISTER_FOR_AUTH_STATE_CHANGE: &str = "auth.registerForAuthStateChange";
pub const SIGN_IN_WITH_POPUP: &str = "auth.signInWithPopup";
pub const SIGN_IN_WITH_REDIRECT: &str = "auth.signInWithRedirect";
pub const SIGN_OUT: &str = "auth.signOut";
pub const GET_CURRENT_USER: &str = "auth.getCurrentUser";
pub const IS_SIGNED_IN: &str = "auth.isSignedIn";
pub const SET_PERSISTENCE: &str = "auth.setPersistence";

/// Google sign-in session backed by the script-side auth module.
///
/// Only one session may be alive at a time: it is the instance the
/// `OnAuthStateChangedCallback` entry point routes to.
pub struct AuthSession {
    gateway: BridgeGateway,
    loader: Arc<SdkLoader>,
    policy: RetryPolicy,
    listeners: ListenerList<User>,
    push_registered: AtomicBool,
    registration: AsyncMutex<()>,
}

impl AuthSession {
    pub fn builder(gateway: BridgeGateway, loader: Arc<SdkLoader>) -> AuthSessionBuilder {
        AuthSessionBuilder {
            gateway,
            loader,
            policy: RetryPolicy::default(),
            entry_points: None,
        }
    }

    pub async fn sign_in_with_popup(
        &self,
        scopes: Option<&BTreeSet<String>>,
    ) -> AuthOperationResult {
        self.sign_in(SIGN_IN_WITH_POPUP, scopes).await
    }

    /// Starts a redirect sign-in. The page usually navigates away before this
    /// resolves; the outcome then arrives as an auth-state push on the next load.
    pub async fn sign_in_with_redirect(
        &self,
        scopes: Option<&BTreeSet<String>>,
    ) -> AuthOperationResult {
        self.sign_in(SIGN_IN_WITH_REDIRECT, scopes).await
    }

    pub async fn sign_out(&self) -> AuthOperationResult {
        self.prepare(SIGN_OUT).await;
        let was_signed_in = self.was_signed_in(SIGN_OUT).await;

        let result = self.run_once(SIGN_OUT, Vec::new()).await;
        if result.success && was_signed_in {
            self.listeners.notify(None);
        }
        result
    }

    /// The signed-in user, or `None` when nobody is signed in or the script side
    /// could not be reached after every retry.
    pub async fn current_user(&self) -> Option<User> {
        self.prepare(GET_CURRENT_USER).await;
        match self
            .gateway
            .invoke_text_with_retry(GET_CURRENT_USER, Vec::new(), self.policy)
            .await
        {
            Ok(raw) => parse_user(&raw),
            Err(err) => {
                LOGGER.error(format!("Failed to read the current user: {err}"));
                None
            }
        }
    }

    pub async fn is_signed_in(&self) -> AuthResult<bool> {
        self.prepare(IS_SIGNED_IN).await;
        Ok(self
            .gateway
            .invoke_bool_with_retry(IS_SIGNED_IN, Vec::new(), self.policy)
            .await?)
    }

    /// Sets how long the sign-in survives. Accepts a [`Persistence`] or any string;
    /// modes the script side does not know are answered with `false`.
    ///
    /// [`Persistence`]: crate::auth::Persistence
    pub async fn set_persistence(&self, mode: impl AsRef<str>) -> AuthResult<bool> {
        self.prepare(SET_PERSISTENCE).await;
        let mode = Value::String(mode.as_ref().to_string());
        Ok(self
            .gateway
            .invoke_bool_with_retry(SET_PERSISTENCE, vec![mode], self.policy)
            .await?)
    }

    /// Registers a callback for every auth-state change, pushed or explicit.
    ///
    /// Delivery is not exactly-once: an explicit sign-in and the backend push for the
    /// same transition may both reach the callback.
    pub fn on_auth_state_changed<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Principal recomputed from the current user on every call.
    pub async fn authentication_state(&self) -> Principal {
        Principal::from(self.current_user().await.as_ref())
    }

    /// Arms the backend auth-state listener. Safe to call repeatedly; once the
    /// registration succeeded later calls do nothing. Concurrent callers wait for the
    /// registration in flight instead of registering twice.
    pub async fn register_for_auth_state_changes(&self) -> bool {
        if self.push_registered.load(Ordering::SeqCst) {
            return true;
        }
        let _guard = self.registration.lock().await;
        if self.push_registered.load(Ordering::SeqCst) {
            return true;
        }
        let args = vec![
            Value::String(HOST_MODULE.to_string()),
            Value::String(AUTH_STATE_CALLBACK.to_string()),
        ];
        match self
            .gateway
            .invoke_bool_with_retry(REGISTER_FOR_AUTH_STATE_CHANGE, args, self.policy)
            .await
        {
            Ok(true) => {
                self.push_registered.store(true, Ordering::SeqCst);
                true
            }
            Ok(false) => {
                LOGGER.warn("Auth-state listener registration was refused");
                false
            }
            Err(err) => {
                LOGGER.error(format!("Failed to register for auth-state changes: {err}"));
                false
            }
        }
    }

    pub fn is_registered_for_push(&self) -> bool {
        self.push_registered.load(Ordering::SeqCst)
    }

    /// Forwards a pushed user payload to every listener, without de-duplication.
    pub(crate) fn handle_auth_state_push(&self, user_json: &str) {
        let user = parse_user(user_json);
        LOGGER.debug(format!(
            "Auth state pushed: {}",
            user.as_ref().map_or("signed out", |user| user.uid.as_str())
        ));
        self.listeners.notify(user.as_ref());
    }

    async fn sign_in(
        &self,
        operation: &str,
        scopes: Option<&BTreeSet<String>>,
    ) -> AuthOperationResult {
        self.prepare(operation).await;
        let was_signed_in = self.was_signed_in(operation).await;

        let scopes = match scopes {
            Some(scopes) => Value::Array(scopes.iter().cloned().map(Value::String).collect()),
            None => Value::Null,
        };
        let result = self.run_once(operation, vec![scopes]).await;

        if result.success && !was_signed_in {
            let user = match &result.user {
                Some(user) => Some(user.clone()),
                None => self.current_user().await,
            };
            self.listeners.notify(user.as_ref());
        }
        result
    }

    async fn run_once(&self, operation: &str, args: Vec<Value>) -> AuthOperationResult {
        match self.gateway.invoke_text(operation, args).await {
            Ok(raw) => parse_auth_result(&raw),
            Err(err) => {
                LOGGER.error(format!("{operation} failed: {err}"));
                AuthOperationResult::from_bridge_error(&err)
            }
        }
    }

    async fn was_signed_in(&self, operation: &str) -> bool {
        self.is_signed_in().await.unwrap_or_else(|err| {
            LOGGER.warn(format!(
                "{operation}: sign-in state unknown ({err}), assuming signed out"
            ));
            false
        })
    }

    async fn prepare(&self, operation: &str) {
        self.loader.ensure_loaded_for(operation).await;
        self.register_for_auth_state_changes().await;
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("policy", &self.policy)
            .field("listeners", &self.listeners)
            .field("push_registered", &self.is_registered_for_push())
            .finish()
    }
}

pub struct AuthSessionBuilder {
    gateway: BridgeGateway,
    loader: Arc<SdkLoader>,
    policy: RetryPolicy,
    entry_points: Option<Arc<EntryPoints>>,
}

impl AuthSessionBuilder {
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers the session in `entry_points` instead of the process-wide set.
    pub fn entry_points(mut self, entry_points: Arc<EntryPoints>) -> Self {
        self.entry_points = Some(entry_points);
        self
    }

    /// Builds the session, claims the auth-state entry point and arms the backend
    /// listener in the background, so pushes arrive before any auth call is made.
    pub fn build(self) -> AuthResult<Arc<AuthSession>> {
        let session = Arc::new(AuthSession {
            gateway: self.gateway,
            loader: self.loader,
            policy: self.policy,
            listeners: ListenerList::new(),
            push_registered: AtomicBool::new(false),
            registration: AsyncMutex::new(()),
        });
        let entry_points = self.entry_points.unwrap_or_else(host::entry_points);
        entry_points.auth().claim(&session)?;

        let pending = Arc::downgrade(&session);
        spawn_detached(async move {
            if let Some(session) = pending.upgrade() {
                session.prepare(REGISTER_FOR_AUTH_STATE_CHANGE).await;
            }
        });
        Ok(session)
    }
}
