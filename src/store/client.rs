use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::bootstrap::SdkLoader;
use crate::bridge::{BridgeGateway, EntryPointError, HOST_MODULE};
use crate::host::{self, EntryPoints, SNAPSHOT_CALLBACK};
use crate::marshal::{decode_snapshot, parse_store_result};
use crate::store::merge::merge_non_null;
use crate::store::subscriptions::{Deliver, Dispatch, Subscription, SubscriptionRegistry};
use crate::store::types::{
    StoreAck, StoreDocument, StoreOperationResult, UserDocument, USERS_COLLECTION,
};
use crate::store::LOGGER;

pub const ADD_DOCUMENT: &str = "store.addDocument";
pub const GET_DOCUMENT: &str = "store.getDocument";
pub const GET_ALL_DOCUMENTS: &str = "store.getAllDocuments";
pub const SET_DOCUMENT: &str = "store.setDocument";
pub const UPDATE_DOCUMENT: &str = "store.updateDocument";
pub const DELETE_DOCUMENT: &str = "store.deleteDocument";
pub const ON_DOCUMENT_SNAPSHOT: &str = "store.onDocumentSnapshot";
pub const OFF_DOCUMENT_SNAPSHOT: &str = "store.offDocumentSnapshot";

/// Document store client over the script-side store module.
///
/// Every operation answers with a [`StoreOperationResult`]; invalid arguments are
/// rejected locally and transport failures are folded into failure results.
pub struct DocumentStore {
    gateway: BridgeGateway,
    loader: Arc<SdkLoader>,
    subscriptions: SubscriptionRegistry,
}

impl DocumentStore {
    /// Builds the client and claims the `OnSnapshotCallback` entry point.
    pub fn new(
        gateway: BridgeGateway,
        loader: Arc<SdkLoader>,
    ) -> Result<Arc<DocumentStore>, EntryPointError> {
        Self::with_entry_points(gateway, loader, host::entry_points())
    }

    pub fn with_entry_points(
        gateway: BridgeGateway,
        loader: Arc<SdkLoader>,
        entry_points: Arc<EntryPoints>,
    ) -> Result<Arc<DocumentStore>, EntryPointError> {
        let store = Arc::new(DocumentStore {
            gateway,
            loader,
            subscriptions: SubscriptionRegistry::default(),
        });
        entry_points.store().claim(&store)?;
        Ok(store)
    }

    /// Creates a document with a backend-assigned id. The returned document carries
    /// its new reference.
    pub async fn add_document<T: StoreDocument>(
        &self,
        collection: &str,
        document: &T,
    ) -> StoreOperationResult<T> {
        if let Err(reason) = require(&[("collection", collection)]) {
            return invalid(ADD_DOCUMENT, reason);
        }
        let encoded = match encode_document(document) {
            Ok(encoded) => encoded,
            Err(reason) => return invalid(ADD_DOCUMENT, reason),
        };
        self.call(ADD_DOCUMENT, vec![text(collection), Value::String(encoded)])
            .await
    }

    /// A missing document is a success without a document.
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> StoreOperationResult<T> {
        if let Err(reason) = require(&[("collection", collection), ("document id", doc_id)]) {
            return invalid(GET_DOCUMENT, reason);
        }
        self.call(GET_DOCUMENT, vec![text(collection), text(doc_id)])
            .await
    }

    /// Reads the whole collection in one call.
    pub async fn get_all_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> StoreOperationResult<T> {
        if let Err(reason) = require(&[("collection", collection)]) {
            return invalid(GET_ALL_DOCUMENTS, reason);
        }
        self.call(GET_ALL_DOCUMENTS, vec![text(collection)]).await
    }

    /// Replaces or creates the document at `collection/doc_id`.
    pub async fn set_document<T: StoreDocument>(
        &self,
        collection: &str,
        doc_id: &str,
        document: &T,
    ) -> StoreOperationResult<T> {
        if let Err(reason) = require(&[("collection", collection), ("document id", doc_id)]) {
            return invalid(SET_DOCUMENT, reason);
        }
        let encoded = match encode_document(document) {
            Ok(encoded) => encoded,
            Err(reason) => return invalid(SET_DOCUMENT, reason),
        };
        self.call(
            SET_DOCUMENT,
            vec![text(collection), text(doc_id), Value::String(encoded)],
        )
        .await
    }

    /// Merges the fields of `partial` into an existing `P` document.
    ///
    /// `C` carries only the fields to change; anything it serializes, nulls included,
    /// is written.
    pub async fn update_document<P, C>(
        &self,
        collection: &str,
        doc_id: &str,
        partial: &C,
    ) -> StoreOperationResult<P>
    where
        P: StoreDocument,
        C: Serialize,
    {
        if let Err(reason) = require(&[("collection", collection), ("document id", doc_id)]) {
            return invalid(UPDATE_DOCUMENT, reason);
        }
        let encoded = match encode_document(partial) {
            Ok(encoded) => encoded,
            Err(reason) => return invalid(UPDATE_DOCUMENT, reason),
        };
        self.call(
            UPDATE_DOCUMENT,
            vec![text(collection), text(doc_id), Value::String(encoded)],
        )
        .await
    }

    /// Writes the signed-in user's document at `users/{uid}` without erasing stored
    /// fields the caller left empty.
    pub async fn set_current_user_document<T: UserDocument>(
        &self,
        document: &T,
    ) -> StoreOperationResult<T> {
        let uid = match document.uid() {
            Some(uid) if !uid.trim().is_empty() => uid.to_string(),
            _ => return invalid(SET_DOCUMENT, "user document has no uid".to_string()),
        };
        let incoming = match to_object(document) {
            Ok(incoming) => incoming,
            Err(reason) => return invalid(SET_DOCUMENT, reason),
        };

        let existing = self.get_document::<Value>(USERS_COLLECTION, &uid).await;
        if !existing.success {
            LOGGER.error(format!(
                "Not writing {USERS_COLLECTION}/{uid}: existing document could not be read"
            ));
            return existing.discard_payload();
        }

        let merged = match existing.document {
            Some(stored) => merge_non_null(stored, incoming),
            None => incoming,
        };
        let encoded = merged.to_string();
        self.call(
            SET_DOCUMENT,
            vec![text(USERS_COLLECTION), text(&uid), Value::String(encoded)],
        )
        .await
    }

    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> StoreAck {
        if let Err(reason) = require(&[("collection", collection), ("document id", doc_id)]) {
            return invalid(DELETE_DOCUMENT, reason);
        }
        self.call(DELETE_DOCUMENT, vec![text(collection), text(doc_id)])
            .await
    }

    /// Delivers every change of `collection/doc_id` to `callback`; `None` means the
    /// document was deleted.
    ///
    /// Subscriptions are keyed by document id: while one is active for `doc_id`,
    /// further calls succeed without arming another listener.
    pub async fn subscribe_for_document_updates<T, F>(
        &self,
        collection: &str,
        doc_id: &str,
        callback: F,
    ) -> StoreAck
    where
        T: StoreDocument,
        F: Fn(Option<T>) + Send + Sync + 'static,
    {
        if let Err(reason) = require(&[("collection", collection), ("document id", doc_id)]) {
            return invalid(ON_DOCUMENT_SNAPSHOT, reason);
        }
        self.loader.ensure_loaded_for(ON_DOCUMENT_SNAPSHOT).await;

        let deliver: Deliver = Arc::new(move |raw: &str| {
            callback(decode_snapshot::<T>(raw)?);
            Ok(())
        });
        let subscription = Subscription {
            collection: collection.to_string(),
            type_name: std::any::type_name::<T>(),
            deliver,
        };
        if !self.subscriptions.insert_if_absent(doc_id, subscription) {
            LOGGER.debug(format!("Already subscribed to {doc_id}"));
            return StoreAck::succeeded();
        }

        let args = vec![
            text(collection),
            text(doc_id),
            text(HOST_MODULE),
            text(SNAPSHOT_CALLBACK),
        ];
        let result: StoreAck = self.invoke(ON_DOCUMENT_SNAPSHOT, args).await;
        if !result.success {
            self.subscriptions.remove(doc_id);
        }
        result
    }

    /// Drops the subscription for `doc_id` and disarms the backend listener.
    pub async fn unsubscribe_from_document_updates(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> StoreAck {
        if let Err(reason) = require(&[("collection", collection), ("document id", doc_id)]) {
            return invalid(OFF_DOCUMENT_SNAPSHOT, reason);
        }
        let Some(subscription) = self.subscriptions.remove(doc_id) else {
            return StoreAck::succeeded();
        };
        if subscription.collection != collection {
            LOGGER.warn(format!(
                "Subscription for {doc_id} was made on '{}', disarming '{collection}'",
                subscription.collection
            ));
        }
        self.call(OFF_DOCUMENT_SNAPSHOT, vec![text(collection), text(doc_id)])
            .await
    }

    pub fn is_subscribed(&self, doc_id: &str) -> bool {
        self.subscriptions.contains(doc_id)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Routes a pushed snapshot to its subscriber. Nothing is reported back to the
    /// push source; misses and unreadable payloads are logged and dropped.
    pub(crate) fn handle_snapshot_push(&self, doc_id: &str, doc_json: &str) {
        let type_name = self.subscriptions.type_name_of(doc_id);
        match self.subscriptions.dispatch(doc_id, doc_json) {
            Dispatch::Delivered => {}
            Dispatch::Unknown => LOGGER.warn(format!(
                "Dropping snapshot for unsubscribed document {doc_id}"
            )),
            Dispatch::Rejected(err) => LOGGER.error(format!(
                "Dropping snapshot for {}/{doc_id} as {}: {err}; payload: {doc_json}",
                self.subscriptions.collection_of(doc_id).unwrap_or_default(),
                type_name.unwrap_or("?"),
            )),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: Vec<Value>,
    ) -> StoreOperationResult<T> {
        self.loader.ensure_loaded_for(operation).await;
        self.invoke(operation, args).await
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: Vec<Value>,
    ) -> StoreOperationResult<T> {
        match self.gateway.invoke_text(operation, args).await {
            Ok(raw) => parse_store_result(&raw),
            Err(err) => {
                LOGGER.error(format!("{operation} failed: {err}"));
                StoreOperationResult::from_bridge_error(&err)
            }
        }
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

fn require(fields: &[(&str, &str)]) -> Result<(), String> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(format!("{name} must not be blank")),
        None => Ok(()),
    }
}

fn invalid<T>(operation: &str, reason: String) -> StoreOperationResult<T> {
    LOGGER.error(format!("{operation}: {reason}"));
    StoreOperationResult::invalid_arguments(reason)
}

fn to_object<T: Serialize + ?Sized>(document: &T) -> Result<Value, String> {
    match serde_json::to_value(document) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(Value::Null) => Err("document is null".to_string()),
        Ok(other) => Err(format!("document must be a JSON object, found {other}")),
        Err(err) => Err(format!("document cannot be serialized: {err}")),
    }
}

fn encode_document<T: Serialize + ?Sized>(document: &T) -> Result<String, String> {
    to_object(document).map(|value| value.to_string())
}
