use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::BridgeError;

/// Error name reported when a call is rejected before reaching the backend.
pub const INVALID_ARGUMENTS: &str = "Invalid Arguments";

/// Collection holding one document per signed-in user, keyed by uid.
pub const USERS_COLLECTION: &str = "users";

/// Wire name of the reference field every stored document carries.
pub const DOC_REF_FIELD: &str = "DocRef";

/// Location of a document as reported by the backend.
///
/// `parent_doc_ref` is `None` for top-level documents; the script side encodes that
/// as an empty object, which is normalized away while parsing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentReference {
    #[serde(rename = "docId", alias = "doc_id")]
    pub doc_id: String,
    #[serde(rename = "docPath", alias = "doc_path")]
    pub doc_path: String,
    #[serde(
        rename = "parentDocRef",
        alias = "parent_doc_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_doc_ref: Option<Box<DocumentReference>>,
}

impl DocumentReference {
    pub fn new(doc_id: impl Into<String>, doc_path: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            doc_path: doc_path.into(),
            parent_doc_ref: None,
        }
    }

    pub fn with_parent(mut self, parent: DocumentReference) -> Self {
        self.parent_doc_ref = Some(Box::new(parent));
        self
    }

    /// Collection segment of the path, `users` for `users/u1`.
    pub fn collection(&self) -> Option<&str> {
        let (collection, _) = self.doc_path.rsplit_once('/')?;
        collection.rsplit('/').next()
    }
}

/// A record stored in a collection.
///
/// Implementors keep their own field names; the reference is expected under the
/// `DocRef` key, usually declared as
/// `#[serde(rename = "DocRef", default)] doc_ref: Option<DocumentReference>`.
pub trait StoreDocument: Serialize + DeserializeOwned + Send + 'static {
    fn doc_ref(&self) -> Option<&DocumentReference>;
}

/// A document stored under [`USERS_COLLECTION`] and keyed by the owner's uid.
pub trait UserDocument: StoreDocument {
    fn uid(&self) -> Option<&str>;
}

/// Outcome of a document store call.
///
/// `document` is filled by single-document operations, `document_list` by collection
/// scans; both stay empty for writes and for a lookup of a missing document.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreOperationResult<T> {
    pub success: bool,
    pub document: Option<T>,
    pub document_list: Option<Vec<T>>,
    pub error_code: Option<String>,
    pub error_name: Option<String>,
    pub error_json: Option<String>,
}

/// Result of calls that carry no typed payload (deletes, subscriptions).
pub type StoreAck = StoreOperationResult<Value>;

impl<T> StoreOperationResult<T> {
    /// Bare failure with nothing else populated.
    pub fn failure() -> Self {
        Self {
            success: false,
            document: None,
            document_list: None,
            error_code: None,
            error_name: None,
            error_json: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::failure()
        }
    }

    pub fn with_document(document: T) -> Self {
        Self {
            document: Some(document),
            ..Self::succeeded()
        }
    }

    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self {
            error_name: Some(INVALID_ARGUMENTS.to_string()),
            error_json: Some(Value::String(reason.into()).to_string()),
            ..Self::failure()
        }
    }

    pub(crate) fn from_bridge_error(error: &BridgeError) -> Self {
        Self {
            error_code: Some(error.code().to_string()),
            error_name: Some(error.operation().to_string()),
            error_json: Some(Value::String(error.to_string()).to_string()),
            ..Self::failure()
        }
    }

    pub fn is_invalid_arguments(&self) -> bool {
        self.error_name.as_deref() == Some(INVALID_ARGUMENTS)
    }

    /// Keeps the outcome and error details, dropping the typed payload.
    pub fn discard_payload<U>(self) -> StoreOperationResult<U> {
        StoreOperationResult {
            success: self.success,
            document: None,
            document_list: None,
            error_code: self.error_code,
            error_name: self.error_name,
            error_json: self.error_json,
        }
    }

    pub fn into_ack(self) -> StoreAck {
        self.discard_payload()
    }
}
