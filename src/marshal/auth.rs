use serde_json::Value;

use crate::auth::{AuthOperationResult, User};
use crate::logger::LogArgument;
use crate::marshal::case::CaseInsensitive;
use crate::marshal::error::MarshalError;
use crate::marshal::LOGGER;

/// Reads a sign-in or sign-out outcome. Never fails: malformed input yields a bare
/// failure result and the raw payload is logged.
pub fn parse_auth_result(raw: &str) -> AuthOperationResult {
    match try_parse_auth_result(raw) {
        Ok(result) => result,
        Err(err) => {
            LOGGER.error_with([
                LogArgument::Text(format!("Failed to read auth result: {err}")),
                LogArgument::Text(raw.to_string()),
            ]);
            AuthOperationResult::failure()
        }
    }
}

pub fn try_parse_auth_result(raw: &str) -> Result<AuthOperationResult, MarshalError> {
    let value = serde_json::from_str::<Value>(raw)?;
    if !value.is_object() {
        return Err(MarshalError::shape("auth result is not a JSON object"));
    }
    let mut result: AuthOperationResult = CaseInsensitive::deserialize(value)
        .map_err(MarshalError::document::<AuthOperationResult>)?;
    result.user = result.user.filter(User::is_present);
    Ok(result)
}

/// Reads a user payload; `{}`, `null` and anything unreadable mean no user.
pub fn parse_user(raw: &str) -> Option<User> {
    match try_parse_user(raw) {
        Ok(user) => user,
        Err(err) => {
            LOGGER.error_with([
                LogArgument::Text(format!("Failed to read user: {err}")),
                LogArgument::Text(raw.to_string()),
            ]);
            None
        }
    }
}

pub fn try_parse_user(raw: &str) -> Result<Option<User>, MarshalError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let value = match serde_json::from_str::<Value>(raw)? {
        Value::Null => return Ok(None),
        Value::String(encoded) => serde_json::from_str::<Value>(&encoded)?,
        value => value,
    };
    if value.is_null() {
        return Ok(None);
    }
    if !value.is_object() {
        return Err(MarshalError::shape("user is not a JSON object"));
    }
    let user: User =
        CaseInsensitive::deserialize(value).map_err(MarshalError::document::<User>)?;
    Ok(Some(user).filter(User::is_present))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signed_in_user() -> Value {
        json!({
            "uid": "u1",
            "displayName": "Ada Lovelace",
            "photoURL": "https://example.com/ada.png",
            "email": "ada@example.com",
            "emailVerified": true,
            "isAnonymous": false,
            "phoneNumber": null,
            "tenantId": null,
            "providerData": [{
                "uid": "1234",
                "displayName": "Ada Lovelace",
                "photoURL": null,
                "email": "ada@example.com",
                "phoneNumber": null,
                "providerId": "google.com"
            }],
            "stsTokenManager": {
                "apiKey": "key",
                "refreshToken": "refresh",
                "accessToken": "access",
                "expirationTime": 1700000000000_i64
            },
            "apiKey": "key",
            "appName": "[DEFAULT]",
            "authDomain": "demo.firebaseapp.com",
            "createdAt": "1600000000000",
            "lastLoginAt": 1700000000000_i64
        })
    }

    #[test]
    fn user_fields_are_read_from_sdk_names() {
        let user = parse_user(&signed_in_user().to_string()).unwrap();

        assert_eq!(user.uid, "u1");
        assert_eq!(user.photo_url.as_deref(), Some("https://example.com/ada.png"));
        assert!(user.email_verified);
        assert_eq!(user.provider_data[0].provider_id, "google.com");
        let tokens = user.sts_token_manager.unwrap();
        assert_eq!(tokens.expiration_time, Some(1_700_000_000_000));
        assert_eq!(user.created_at.as_deref(), Some("1600000000000"));
        assert_eq!(user.last_login_at.as_deref(), Some("1700000000000"));
    }

    #[test]
    fn absent_users() {
        assert_eq!(parse_user("{}"), None);
        assert_eq!(parse_user("null"), None);
        assert_eq!(parse_user(""), None);
        assert_eq!(parse_user(r#"{"uid":""}"#), None);
        assert_eq!(parse_user("[]"), None);
    }

    #[test]
    fn sign_in_result_is_read_in_full() {
        let raw = json!({
            "Success": true,
            "User": signed_in_user(),
            "Credential": {
                "providerId": "google.com",
                "signInMethod": "google.com",
                "oauthIdToken": "id-token",
                "oauthAccessToken": "access-token"
            },
            "AdditionalUserInfo": {
                "providerId": "google.com",
                "isNewUser": false,
                "profile": {"name": "Ada Lovelace", "verified_email": true, "granted_scopes": "openid email"}
            },
            "OperationType": "signIn"
        })
        .to_string();

        let result = parse_auth_result(&raw);
        assert!(result.success);
        assert_eq!(result.user.unwrap().uid, "u1");
        assert_eq!(
            result.credential.unwrap().oauth_id_token.as_deref(),
            Some("id-token")
        );
        let info = result.additional_user_info.unwrap();
        assert!(!info.is_new_user);
        assert_eq!(info.profile.unwrap().verified_email, Some(true));
        assert_eq!(result.operation_type.as_deref(), Some("signIn"));
        assert!(result.error.is_none());
    }

    #[test]
    fn failure_result_carries_error() {
        let raw = r#"{"success":false,"error":{"code":"auth/popup-closed-by-user","message":"closed"}}"#;
        let result = parse_auth_result(raw);

        assert!(!result.success);
        assert_eq!(result.error_code(), Some("auth/popup-closed-by-user"));
        assert!(result.user.is_none());
    }

    #[test]
    fn user_keys_match_in_any_casing() {
        let user = parse_user(r#"{"UID":"u1","DISPLAYNAME":"Ada","photourl":"p.png"}"#).unwrap();
        assert_eq!(user.uid, "u1");
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
        assert_eq!(user.photo_url.as_deref(), Some("p.png"));

        let raw = r#"{"SUCCESS":true,"USER":{"uid":"u2","PROVIDERDATA":[{"PROVIDERID":"google.com"}]},"ADDITIONALUSERINFO":{"ISNEWUSER":true},"operationtype":"signIn"}"#;
        let result = parse_auth_result(raw);
        assert!(result.success);
        let user = result.user.unwrap();
        assert_eq!(user.provider_data[0].provider_id, "google.com");
        assert!(result.additional_user_info.unwrap().is_new_user);
        assert_eq!(result.operation_type.as_deref(), Some("signIn"));
    }

    #[test]
    fn malformed_result_is_a_bare_failure() {
        assert_eq!(parse_auth_result("<html>"), AuthOperationResult::failure());
        assert_eq!(
            parse_auth_result(r#"{"success":"maybe"}"#),
            AuthOperationResult::failure()
        );
    }
}
