use std::fmt;

use crate::bridge::BridgeError;

pub type BootstrapResult<T> = Result<T, BootstrapError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// No configuration was supplied and none could be discovered.
    MissingConfig(String),
    /// The hosting endpoint could not be reached or answered with garbage.
    ConfigFetch(String),
    /// A boundary step kept failing after every retry.
    Bridge(BridgeError),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::MissingConfig(message) => {
                write!(f, "No backend configuration available: {message}")
            }
            BootstrapError::ConfigFetch(message) => {
                write!(f, "Failed to fetch backend configuration: {message}")
            }
            BootstrapError::Bridge(err) => write!(f, "SDK initialization failed: {err}"),
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::Bridge(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BridgeError> for BootstrapError {
    fn from(err: BridgeError) -> Self {
        BootstrapError::Bridge(err)
    }
}

impl From<reqwest::Error> for BootstrapError {
    fn from(err: reqwest::Error) -> Self {
        BootstrapError::ConfigFetch(err.to_string())
    }
}
