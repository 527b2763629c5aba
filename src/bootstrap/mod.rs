//! One-time initialization of the backend SDK in the page script context.
//!
//! [`SdkLoader`] resolves the backend configuration, creates the app handle through
//! `loadSdk` and prepares the enabled sub-modules, in that order. Each step is
//! retried with the default [`RetryPolicy`](crate::bridge::RetryPolicy).

mod config;
mod error;
mod loader;
mod types;

use std::sync::LazyLock;

use crate::logger::Logger;

pub(crate) static LOGGER: LazyLock<Logger> =
    LazyLock::new(|| Logger::new("@firebase-bridge/bootstrap"));

#[doc(inline)]
pub use config::{resolve_backend_config, ConfigSource, HostingConfigSource, HOSTING_INIT_PATH};

#[doc(inline)]
pub use error::{BootstrapError, BootstrapResult};

#[doc(inline)]
pub use loader::{SdkLoader, LOAD_SDK, PREPARE_AUTH, PREPARE_STORE};

#[doc(inline)]
pub use types::{
    BackendConfig, EmulatorSettings, FirebaseModule, SdkInitParams, DEFAULT_AUTH_EMULATOR_URL,
    DEFAULT_STORE_EMULATOR_HOST, DEFAULT_STORE_EMULATOR_PORT,
};
