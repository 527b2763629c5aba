use std::fmt;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure of a single call across the host/script boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The script side is not attached yet (missing root object or function).
    Unavailable { operation: String, message: String },
    /// The script function threw or its promise rejected.
    Script { operation: String, message: String },
    /// Arguments or the returned value could not be converted.
    Conversion { operation: String, message: String },
    /// The call completed but returned a value of the wrong kind.
    UnexpectedResponse { operation: String, found: String },
}

impl BridgeError {
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Unavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn script(operation: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Script {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn conversion(operation: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Conversion {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            BridgeError::Unavailable { operation, .. }
            | BridgeError::Script { operation, .. }
            | BridgeError::Conversion { operation, .. }
            | BridgeError::UnexpectedResponse { operation, .. } => operation,
        }
    }

    /// Short machine-readable code, carried into failure results.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Unavailable { .. } => "bridge/unavailable",
            BridgeError::Script { .. } => "bridge/script-error",
            BridgeError::Conversion { .. } => "bridge/conversion",
            BridgeError::UnexpectedResponse { .. } => "bridge/unexpected-response",
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Unavailable { operation, message } => {
                write!(f, "Bridge operation '{operation}' is not available: {message}")
            }
            BridgeError::Script { operation, message } => {
                write!(f, "Bridge operation '{operation}' failed: {message}")
            }
            BridgeError::Conversion { operation, message } => {
                write!(f, "Bridge operation '{operation}' could not convert values: {message}")
            }
            BridgeError::UnexpectedResponse { operation, found } => {
                write!(f, "Bridge operation '{operation}' returned an unexpected value: {found}")
            }
        }
    }
}

impl std::error::Error for BridgeError {}
