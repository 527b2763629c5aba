//! Conversion of raw script-side JSON into typed results.
//!
//! The script side is loosely typed: key casing drifts between SDK versions and
//! shapes occasionally change. Keys are matched without regard to case or `_`/`-`
//! separators, for the envelopes as well as for the fields of user document types.
//! Anything unreadable turns into a failure result instead of an error.

mod auth;
mod case;
mod document;
mod error;

use std::sync::LazyLock;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::logger::Logger;

pub(crate) static LOGGER: LazyLock<Logger> =
    LazyLock::new(|| Logger::new("@firebase-bridge/marshal"));

#[doc(inline)]
pub use auth::{parse_auth_result, parse_user, try_parse_auth_result, try_parse_user};

#[doc(inline)]
pub use case::{keys_match, loose_key, CaseInsensitive};

#[doc(inline)]
pub use document::{decode_snapshot, parse_store_result, try_parse_store_result};

#[doc(inline)]
pub use error::MarshalError;

/// Accepts timestamps the SDK reports either as strings or as numbers.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
