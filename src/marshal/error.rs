use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    /// The payload is not valid JSON.
    Json(String),
    /// Valid JSON of the wrong shape.
    Shape(String),
    /// A document could not be built into the requested type.
    Document { type_name: String, message: String },
}

impl MarshalError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        MarshalError::Shape(message.into())
    }

    pub(crate) fn document<T>(err: serde_json::Error) -> Self {
        MarshalError::Document {
            type_name: std::any::type_name::<T>().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarshalError::Json(message) => write!(f, "Malformed JSON payload: {message}"),
            MarshalError::Shape(message) => write!(f, "Unexpected payload shape: {message}"),
            MarshalError::Document { type_name, message } => {
                write!(f, "Cannot read document as {type_name}: {message}")
            }
        }
    }
}

impl std::error::Error for MarshalError {}

impl From<serde_json::Error> for MarshalError {
    fn from(err: serde_json::Error) -> Self {
        MarshalError::Json(err.to_string())
    }
}
