//! Document store client over the backend SDK's Firestore module.
//!
//! Documents are plain serde types implementing [`StoreDocument`]. Snapshot pushes
//! arrive through the `OnSnapshotCallback` entry point and are routed by document
//! id to the callback registered with
//! [`DocumentStore::subscribe_for_document_updates`].

mod client;
mod merge;
mod subscriptions;
mod types;

use std::sync::LazyLock;

use crate::logger::Logger;

pub(crate) static LOGGER: LazyLock<Logger> =
    LazyLock::new(|| Logger::new("@firebase-bridge/store"));

#[doc(inline)]
pub use client::{
    DocumentStore, ADD_DOCUMENT, DELETE_DOCUMENT, GET_ALL_DOCUMENTS, GET_DOCUMENT,
    OFF_DOCUMENT_SNAPSHOT, ON_DOCUMENT_SNAPSHOT, SET_DOCUMENT, UPDATE_DOCUMENT,
};

#[doc(inline)]
pub use merge::merge_non_null;

#[doc(inline)]
pub use types::{
    DocumentReference, StoreAck, StoreDocument, StoreOperationResult, UserDocument,
    DOC_REF_FIELD, INVALID_ARGUMENTS, USERS_COLLECTION,
};
