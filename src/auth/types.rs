use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::bridge::BridgeError;
use crate::marshal::lenient_string;

/// Signed-in account as reported by the backend SDK.
///
/// The marshaling layer matches the SDK's keys to these fields without regard to
/// case; serialization produces the SDK's camel case names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct User {
    pub uid: String,
    pub display_name: Option<String>,
    #[serde(rename(serialize = "photoURL"))]
    pub photo_url: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub is_anonymous: bool,
    pub tenant_id: Option<String>,
    pub provider_data: Vec<ProviderEntry>,
    pub api_key: Option<String>,
    pub app_name: Option<String>,
    pub auth_domain: Option<String>,
    pub sts_token_manager: Option<TokenManagerInfo>,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub last_login_at: Option<String>,
}

impl User {
    /// A user object only stands for an account when it carries a uid.
    pub fn is_present(&self) -> bool {
        !self.uid.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ProviderEntry {
    pub uid: String,
    pub display_name: Option<String>,
    #[serde(rename(serialize = "photoURL"))]
    pub photo_url: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub provider_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct TokenManagerInfo {
    pub api_key: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub expiration_time: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct Credential {
    pub provider_id: Option<String>,
    pub sign_in_method: Option<String>,
    #[serde(alias = "id_token")]
    pub oauth_id_token: Option<String>,
    #[serde(alias = "access_token")]
    pub oauth_access_token: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct AdditionalUserInfo {
    pub provider_id: Option<String>,
    pub is_new_user: bool,
    pub profile: Option<Profile>,
}

/// Identity provider profile. Google reports these keys in snake case already.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub verified_email: Option<bool>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    pub granted_scopes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthErrorInfo {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Outcome of a sign-in or sign-out call.
///
/// Every part is optional; an absent user means the call did not report one, not
/// that nobody is signed in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct AuthOperationResult {
    pub success: bool,
    pub user: Option<User>,
    pub credential: Option<Credential>,
    pub additional_user_info: Option<AdditionalUserInfo>,
    pub operation_type: Option<String>,
    pub error: Option<AuthErrorInfo>,
}

impl AuthOperationResult {
    pub fn failure() -> Self {
        Self::default()
    }

    pub(crate) fn from_bridge_error(error: &BridgeError) -> Self {
        Self {
            error: Some(AuthErrorInfo {
                code: Some(error.code().to_string()),
                message: Some(error.to_string()),
            }),
            ..Self::failure()
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().and_then(|error| error.code.as_deref())
    }
}

/// Where the backend keeps the signed-in state between page loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Persistence {
    /// Nothing is kept; a reload signs the user out.
    Disabled,
    /// Kept for the lifetime of the browser tab.
    Session,
    /// Kept until an explicit sign-out.
    Local,
}

impl Persistence {
    pub fn as_str(self) -> &'static str {
        match self {
            Persistence::Disabled => "NONE",
            Persistence::Session => "SESSION",
            Persistence::Local => "LOCAL",
        }
    }
}

impl AsRef<str> for Persistence {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persistence {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Persistence::Disabled),
            "SESSION" => Ok(Persistence::Session),
            "LOCAL" => Ok(Persistence::Local),
            _ => Err(AuthError::UnknownPersistence(value.to_string())),
        }
    }
}
