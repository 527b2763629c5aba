use std::fmt;
use std::sync::Arc;

use async_lock::OnceCell;
use serde_json::Value;

use crate::bootstrap::config::{resolve_backend_config, ConfigSource, HostingConfigSource};
use crate::bootstrap::error::BootstrapResult;
use crate::bootstrap::types::SdkInitParams;
use crate::bootstrap::LOGGER;
use crate::bridge::{BridgeGateway, RetryPolicy};

pub const LOAD_SDK: &str = "loadSdk";
pub const PREPARE_AUTH: &str = "prepareAuth";
pub const PREPARE_STORE: &str = "prepareStore";

/// One-time, ordered initialization of the backend SDK in the script context.
///
/// The first caller of [`SdkLoader::ensure_loaded`] runs the sequence; concurrent
/// callers wait for that run and every caller observes the same cached outcome,
/// including a failure.
pub struct SdkLoader {
    gateway: BridgeGateway,
    params: SdkInitParams,
    config_source: Option<Arc<dyn ConfigSource>>,
    policy: RetryPolicy,
    outcome: OnceCell<BootstrapResult<()>>,
}

impl SdkLoader {
    pub fn new(gateway: BridgeGateway, params: SdkInitParams) -> Self {
        Self {
            gateway,
            params,
            config_source: Some(Arc::new(HostingConfigSource::new())),
            policy: RetryPolicy::default(),
            outcome: OnceCell::new(),
        }
    }

    pub fn with_config_source(mut self, source: Option<Arc<dyn ConfigSource>>) -> Self {
        self.config_source = source;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn params(&self) -> &SdkInitParams {
        &self.params
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome.get(), Some(Ok(())))
    }

    pub async fn ensure_loaded(&self) -> BootstrapResult<()> {
        self.outcome.get_or_init(|| self.run()).await.clone()
    }

    /// Used ahead of dependent calls: a failed bootstrap is reported but does not stop
    /// the caller, whose own boundary call then fails or retries on its own terms.
    pub(crate) async fn ensure_loaded_for(&self, caller: &str) {
        if let Err(err) = self.ensure_loaded().await {
            LOGGER.warn(format!("{caller}: SDK not initialized ({err}), calling anyway"));
        }
    }

    async fn run(&self) -> BootstrapResult<()> {
        let outcome = self.load().await;
        match &outcome {
            Ok(()) => LOGGER.debug("SDK initialized"),
            Err(err) => LOGGER.error(format!("SDK initialization failed: {err}")),
        }
        outcome
    }

    async fn load(&self) -> BootstrapResult<()> {
        let mut params = self.params.clone();
        match resolve_backend_config(params.firebase_config.as_ref(), self.config_source.as_deref())
            .await
        {
            Ok(config) => params.firebase_config = Some(config),
            // The script side falls back to the hosting init script.
            Err(err) => LOGGER.warn(format!("Loading SDK without explicit configuration: {err}")),
        }

        self.gateway
            .invoke_with_retry(LOAD_SDK, vec![Value::String(params.to_json())], self.policy)
            .await?;

        if params.use_auth_module {
            let options = params.auth_options().to_string();
            self.gateway
                .invoke_with_retry(PREPARE_AUTH, vec![Value::String(options)], self.policy)
                .await?;
        }

        if params.use_store_module {
            let options = params.store_options().to_string();
            self.gateway
                .invoke_with_retry(PREPARE_STORE, vec![Value::String(options)], self.policy)
                .await?;
        }

        Ok(())
    }
}

impl fmt::Debug for SdkLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkLoader")
            .field("params", &self.params)
            .field("policy", &self.policy)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::bootstrap::{BackendConfig, BootstrapError, FirebaseModule};
    use crate::bridge::BridgeError;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    fn params(modules: &[FirebaseModule]) -> SdkInitParams {
        let config = BackendConfig {
            api_key: "key".into(),
            project_id: "demo".into(),
            ..Default::default()
        };
        SdkInitParams::from_modules("demo", Some(config), modules)
    }

    fn loader(transport: Arc<ScriptedTransport>, modules: &[FirebaseModule]) -> SdkLoader {
        SdkLoader::new(BridgeGateway::new(transport), params(modules))
            .with_config_source(None)
            .with_retry_policy(RetryPolicy::immediate(5))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn auth_only_bootstrap_skips_store() {
        let transport = Arc::new(ScriptedTransport::new(|_, _, _| Ok(Value::Null)));
        let loader = loader(transport.clone(), &[FirebaseModule::Authentication]);

        loader.ensure_loaded().await.unwrap();

        let operations: Vec<_> = transport.calls().into_iter().map(|c| c.operation).collect();
        assert_eq!(operations, vec![LOAD_SDK, PREPARE_AUTH]);
        assert!(loader.is_loaded());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn init_params_are_sent_as_json_text() {
        let transport = Arc::new(ScriptedTransport::new(|_, _, _| Ok(Value::Null)));
        let loader = loader(
            transport.clone(),
            &[FirebaseModule::Firestore, FirebaseModule::FirestoreEmulator],
        );

        loader.ensure_loaded().await.unwrap();

        let calls = transport.calls();
        let init: Value = serde_json::from_str(calls[0].args[0].as_str().unwrap()).unwrap();
        assert_eq!(init["useStoreModule"], true);
        assert_eq!(init["firebaseConfig"]["projectId"], "demo");

        assert_eq!(calls[1].operation, PREPARE_STORE);
        let options: Value = serde_json::from_str(calls[1].args[0].as_str().unwrap()).unwrap();
        assert_eq!(options, json!({"emulate": true, "host": "localhost", "port": 8080}));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn repeated_and_concurrent_calls_run_once() {
        let transport = Arc::new(ScriptedTransport::new(|operation, _, attempt| {
            if operation == LOAD_SDK && attempt == 0 {
                Err(BridgeError::unavailable(operation, "not attached"))
            } else {
                Ok(Value::Null)
            }
        }));
        let loader = SdkLoader::new(
            BridgeGateway::new(transport.clone()),
            params(&[FirebaseModule::Authentication, FirebaseModule::Firestore]),
        )
        .with_config_source(None)
        .with_retry_policy(RetryPolicy::new(5, Duration::from_millis(10)));

        let (first, second) = futures::join!(loader.ensure_loaded(), loader.ensure_loaded());
        first.unwrap();
        second.unwrap();
        loader.ensure_loaded().await.unwrap();

        assert_eq!(transport.count(LOAD_SDK), 2);
        assert_eq!(transport.count(PREPARE_AUTH), 1);
        assert_eq!(transport.count(PREPARE_STORE), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn exhausted_retries_are_cached() {
        let transport = Arc::new(ScriptedTransport::new(|operation, _, _| {
            Err(BridgeError::script(operation, "boom"))
        }));
        let loader = loader(transport.clone(), &[FirebaseModule::Authentication]);

        let first = loader.ensure_loaded().await;
        let second = loader.ensure_loaded().await;

        assert_eq!(
            first,
            Err(BootstrapError::Bridge(BridgeError::script(LOAD_SDK, "boom")))
        );
        assert_eq!(first, second);
        assert_eq!(transport.count(LOAD_SDK), 5);
        assert_eq!(transport.count(PREPARE_AUTH), 0);
        assert!(!loader.is_loaded());
    }
}
