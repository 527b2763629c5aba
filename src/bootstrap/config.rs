use reqwest::Client;
use url::Url;

use crate::bootstrap::error::{BootstrapError, BootstrapResult};
use crate::bootstrap::types::BackendConfig;
use crate::bootstrap::LOGGER;
use crate::platform::environment;

/// Reserved hosting path serving the project's web configuration.
pub const HOSTING_INIT_PATH: &str = "/__/firebase/init.json";

/// Last-resort source of the backend configuration.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self) -> BootstrapResult<BackendConfig>;
}

/// Reads the configuration from the hosting reserved URL of the serving origin.
#[derive(Clone, Debug)]
pub struct HostingConfigSource {
    client: Client,
    origin: Option<String>,
}

impl HostingConfigSource {
    /// Uses the origin of the current page.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            origin: None,
        }
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            origin: Some(origin.into()),
        }
    }

    fn endpoint(&self) -> BootstrapResult<Url> {
        let origin = self
            .origin
            .clone()
            .or_else(environment::page_origin)
            .ok_or_else(|| {
                BootstrapError::MissingConfig("no page origin to fetch hosting config from".into())
            })?;
        let base = Url::parse(&origin).map_err(|err| BootstrapError::ConfigFetch(err.to_string()))?;
        base.join(HOSTING_INIT_PATH)
            .map_err(|err| BootstrapError::ConfigFetch(err.to_string()))
    }
}

impl Default for HostingConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl ConfigSource for HostingConfigSource {
    async fn fetch(&self) -> BootstrapResult<BackendConfig> {
        let url = self.endpoint()?;
        LOGGER.debug(format!("Fetching backend configuration from {url}"));
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BootstrapError::ConfigFetch(format!(
                "hosting answered with status {status}"
            )));
        }
        Ok(response.json::<BackendConfig>().await?)
    }
}

/// Picks the supplied configuration, then environment defaults, then `source`.
pub async fn resolve_backend_config(
    supplied: Option<&BackendConfig>,
    source: Option<&dyn ConfigSource>,
) -> BootstrapResult<BackendConfig> {
    if let Some(config) = supplied {
        return Ok(config.clone());
    }

    if let Some(fields) = environment::default_backend_config_json() {
        match BackendConfig::from_json_map(fields) {
            Ok(config) => return Ok(config),
            Err(err) => LOGGER.warn(format!("Ignoring unreadable default configuration: {err}")),
        }
    }

    match source {
        Some(source) => source.fetch().await,
        None => Err(BootstrapError::MissingConfig(
            "none supplied and no defaults found".into(),
        )),
    }
}
