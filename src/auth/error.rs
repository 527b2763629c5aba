use std::fmt;

use crate::bridge::{BridgeError, EntryPointError};

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A query could not be answered after every retry.
    Bridge(BridgeError),
    /// Another live session already receives auth-state events.
    AlreadyRegistered(EntryPointError),
    UnknownPersistence(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Bridge(err) => write!(f, "{err}"),
            AuthError::AlreadyRegistered(err) => write!(f, "{err}"),
            AuthError::UnknownPersistence(mode) => {
                write!(f, "Unknown persistence mode '{mode}', expected NONE, SESSION or LOCAL")
            }
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Bridge(err) => Some(err),
            AuthError::AlreadyRegistered(err) => Some(err),
            AuthError::UnknownPersistence(_) => None,
        }
    }
}

impl From<BridgeError> for AuthError {
    fn from(err: BridgeError) -> Self {
        AuthError::Bridge(err)
    }
}

impl From<EntryPointError> for AuthError {
    fn from(err: EntryPointError) -> Self {
        AuthError::AlreadyRegistered(err)
    }
}
