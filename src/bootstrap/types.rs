use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::bootstrap::error::{BootstrapError, BootstrapResult};

pub const DEFAULT_AUTH_EMULATOR_URL: &str = "http://localhost:9099";
pub const DEFAULT_STORE_EMULATOR_HOST: &str = "localhost";
pub const DEFAULT_STORE_EMULATOR_PORT: u16 = 8080;

/// Web app configuration, as shown in the backend console or served by hosting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(rename = "databaseURL", default)]
    pub database_url: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
}

impl BackendConfig {
    pub fn from_json_map(fields: Map<String, Value>) -> BootstrapResult<Self> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|err| BootstrapError::MissingConfig(err.to_string()))
    }
}

/// Backend services a host can switch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FirebaseModule {
    Authentication,
    /// Routes authentication to the local emulator.
    AuthenticationEmulator,
    Firestore,
    /// Routes the document store to the local emulator.
    FirestoreEmulator,
}

/// Local emulator endpoints, used only when the matching emulate flag is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmulatorSettings {
    pub auth_url: String,
    pub store_host: String,
    pub store_port: u16,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_EMULATOR_URL.to_string(),
            store_host: DEFAULT_STORE_EMULATOR_HOST.to_string(),
            store_port: DEFAULT_STORE_EMULATOR_PORT,
        }
    }
}

/// Everything the script side needs to create the app handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkInitParams {
    pub firebase_project_id: String,
    pub firebase_config: Option<BackendConfig>,
    pub use_auth_module: bool,
    pub emulate_auth_module: bool,
    pub use_store_module: bool,
    pub emulate_store_module: bool,
    #[serde(skip)]
    pub emulators: EmulatorSettings,
}

impl SdkInitParams {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            firebase_project_id: project_id.into(),
            firebase_config: None,
            use_auth_module: false,
            emulate_auth_module: false,
            use_store_module: false,
            emulate_store_module: false,
            emulators: EmulatorSettings::default(),
        }
    }

    /// Builds parameters from the list of enabled modules.
    ///
    /// Listing an emulator module alone does not enable the service; it only reroutes
    /// a service enabled by its plain module.
    pub fn from_modules(
        project_id: impl Into<String>,
        config: Option<BackendConfig>,
        modules: &[FirebaseModule],
    ) -> Self {
        let enabled = |module| modules.contains(&module);
        Self {
            firebase_config: config,
            use_auth_module: enabled(FirebaseModule::Authentication),
            emulate_auth_module: enabled(FirebaseModule::AuthenticationEmulator),
            use_store_module: enabled(FirebaseModule::Firestore),
            emulate_store_module: enabled(FirebaseModule::FirestoreEmulator),
            ..Self::new(project_id)
        }
    }

    pub fn with_emulators(mut self, emulators: EmulatorSettings) -> Self {
        self.emulators = emulators;
        self
    }

    pub fn with_config(mut self, config: BackendConfig) -> Self {
        self.firebase_config = Some(config);
        self
    }

    pub(crate) fn to_json(&self) -> String {
        // Plain strings and booleans only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub(crate) fn auth_options(&self) -> Value {
        if self.emulate_auth_module {
            json!({ "emulate": true, "emulatorUrl": self.emulators.auth_url })
        } else {
            json!({ "emulate": false })
        }
    }

    pub(crate) fn store_options(&self) -> Value {
        if self.emulate_store_module {
            json!({
                "emulate": true,
                "host": self.emulators.store_host,
                "port": self.emulators.store_port,
            })
        } else {
            json!({ "emulate": false })
        }
    }
}
