use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use serde_json::{json, Map, Value};

use crate::bridge::{BridgeError, BridgeResult, BridgeTransport};
use crate::test_support::bridge::RecordedCall;

#[derive(Default)]
struct State {
    collections: BTreeMap<String, BTreeMap<String, Map<String, Value>>>,
    user: Option<Value>,
    persistence: Option<String>,
    armed: BTreeSet<(String, String)>,
    failures: HashMap<String, usize>,
    next_id: u64,
    calls: Vec<RecordedCall>,
}

/// In-memory stand-in for the script-side glue and the backend behind it.
///
/// Answers every boundary operation the way the shipped glue does (JSON text for
/// results, booleans for queries) and records each call.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub const USER_ID: &'static str = "fake-user";
    pub const USER_EMAIL: &'static str = "fake@example.com";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self) {
        self.state.lock().unwrap().user = Some(Self::user_json());
    }

    pub fn signed_in(&self) -> bool {
        self.state.lock().unwrap().user.is_some()
    }

    pub fn persistence(&self) -> Option<String> {
        self.state.lock().unwrap().persistence.clone()
    }

    /// Makes the next `times` calls of `operation` fail as if the glue were missing.
    pub fn fail_next(&self, operation: &str, times: usize) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(operation.to_string(), times);
    }

    /// Stored user fields, without the reference.
    pub fn document(&self, collection: &str, doc_id: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)?
            .get(doc_id)
            .cloned()
            .map(Value::Object)
    }

    pub fn is_armed(&self, collection: &str, doc_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .armed
            .contains(&(collection.to_string(), doc_id.to_string()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn user_json() -> Value {
        json!({
            "uid": Self::USER_ID,
            "displayName": "Fake User",
            "email": Self::USER_EMAIL,
            "emailVerified": true,
            "isAnonymous": false,
            "providerData": [{"uid": "42", "providerId": "google.com", "email": Self::USER_EMAIL}]
        })
    }

    fn answer(&self, state: &mut State, operation: &str, args: &[Value]) -> BridgeResult<Value> {
        let arg = |index: usize| {
            args.get(index)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let reply = |value: Value| Ok(Value::String(value.to_string()));

        match operation {
            "loadSdk" | "prepareAuth" | "prepareStore" => Ok(Value::Null),

            "auth.registerForAuthStateChange" => Ok(Value::Bool(true)),
            "auth.isSignedIn" => Ok(Value::Bool(state.user.is_some())),
            "auth.getCurrentUser" => reply(state.user.clone().unwrap_or_else(|| json!({}))),
            "auth.setPersistence" => {
                let mode = arg(0).to_ascii_uppercase();
                let known = matches!(mode.as_str(), "NONE" | "SESSION" | "LOCAL");
                if known {
                    state.persistence = Some(mode);
                }
                Ok(Value::Bool(known))
            }
            "auth.signInWithPopup" | "auth.signInWithRedirect" => {
                let user = Self::user_json();
                state.user = Some(user.clone());
                reply(json!({
                    "success": true,
                    "user": user,
                    "credential": {"providerId": "google.com", "signInMethod": "google.com"},
                    "additionalUserInfo": {"providerId": "google.com", "isNewUser": false},
                    "operationType": "signIn"
                }))
            }
            "auth.signOut" => {
                state.user = None;
                reply(json!({"success": true}))
            }

            "store.addDocument" => {
                let collection = arg(0);
                let fields = parse_fields(&arg(1));
                state.next_id += 1;
                let doc_id = format!("doc-{}", state.next_id);
                let document = interop(&collection, &doc_id, &fields);
                state.collections.entry(collection).or_default().insert(doc_id, fields);
                reply(json!({"success": true, "document": document}))
            }
            "store.getDocument" => {
                let (collection, doc_id) = (arg(0), arg(1));
                match state.collections.get(&collection).and_then(|docs| docs.get(&doc_id)) {
                    Some(fields) => reply(json!({
                        "success": true,
                        "document": interop(&collection, &doc_id, fields)
                    })),
                    None => reply(json!({"success": true})),
                }
            }
            "store.getAllDocuments" => {
                let collection = arg(0);
                let list: Vec<Value> = state
                    .collections
                    .get(&collection)
                    .map(|docs| {
                        docs.iter()
                            .map(|(doc_id, fields)| interop(&collection, doc_id, fields))
                            .collect()
                    })
                    .unwrap_or_default();
                reply(json!({"success": true, "documentList": list}))
            }
            "store.setDocument" => {
                let (collection, doc_id) = (arg(0), arg(1));
                let fields = parse_fields(&arg(2));
                let document = interop(&collection, &doc_id, &fields);
                state.collections.entry(collection).or_default().insert(doc_id, fields);
                reply(json!({"success": true, "document": document}))
            }
            "store.updateDocument" => {
                let (collection, doc_id) = (arg(0), arg(1));
                let partial = parse_fields(&arg(2));
                match state
                    .collections
                    .get_mut(&collection)
                    .and_then(|docs| docs.get_mut(&doc_id))
                {
                    Some(fields) => {
                        fields.extend(partial);
                        reply(json!({"success": true}))
                    }
                    None => reply(json!({
                        "success": false,
                        "errorCode": "not-found",
                        "errorName": "FirebaseError",
                        "errorJsonStr": json!({"code": "not-found", "name": "FirebaseError"}).to_string()
                    })),
                }
            }
            "store.deleteDocument" => {
                let (collection, doc_id) = (arg(0), arg(1));
                if let Some(docs) = state.collections.get_mut(&collection) {
                    docs.remove(&doc_id);
                }
                reply(json!({"success": true}))
            }
            "store.onDocumentSnapshot" => {
                state.armed.insert((arg(0), arg(1)));
                reply(json!({"success": true}))
            }
            "store.offDocumentSnapshot" => {
                state.armed.remove(&(arg(0), arg(1)));
                reply(json!({"success": true}))
            }

            other => Err(BridgeError::unavailable(other, "unknown operation")),
        }
    }
}

#[async_trait::async_trait]
impl BridgeTransport for FakeBackend {
    async fn call(&self, operation: &str, args: Vec<Value>) -> BridgeResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall {
            operation: operation.to_string(),
            args: args.clone(),
        });
        if let Some(remaining) = state.failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BridgeError::unavailable(operation, "injected failure"));
            }
        }
        self.answer(&mut state, operation, &args)
    }
}

/// The glue strips the reference before storing.
fn parse_fields(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("DocRef");
            fields
        }
        _ => Map::new(),
    }
}

fn interop(collection: &str, doc_id: &str, fields: &Map<String, Value>) -> Value {
    let mut document = fields.clone();
    document.insert(
        "DocRef".to_string(),
        json!({
            "docId": doc_id,
            "docPath": format!("{collection}/{doc_id}"),
            "parentDocRef": {}
        }),
    );
    Value::Object(document)
}
