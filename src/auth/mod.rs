//! Google sign-in through the backend SDK's auth module.
//!
//! [`AuthSession`] wraps the script-side auth operations, keeps the auth-state
//! listeners and receives the backend's auth-state pushes through the
//! `OnAuthStateChangedCallback` entry point.

mod error;
mod principal;
mod session;
mod types;

use std::sync::LazyLock;

use crate::logger::Logger;

pub(crate) static LOGGER: LazyLock<Logger> =
    LazyLock::new(|| Logger::new("@firebase-bridge/auth"));

#[doc(inline)]
pub use error::{AuthError, AuthResult};

#[doc(inline)]
pub use principal::{Claim, ClaimKind, Principal, AUTHENTICATION_TYPE};

#[doc(inline)]
pub use session::{
    AuthSession, AuthSessionBuilder, GET_CURRENT_USER, IS_SIGNED_IN,
    REGISTER_FOR_AUTH_STATE_CHANGE, SET_PERSISTENCE, SIGN_IN_WITH_POPUP, SIGN_IN_WITH_REDIRECT,
    SIGN_OUT,
};

#[doc(inline)]
pub use types::{
    AdditionalUserInfo, AuthErrorInfo, AuthOperationResult, Credential, Persistence, Profile,
    ProviderEntry, TokenManagerInfo, User,
};
