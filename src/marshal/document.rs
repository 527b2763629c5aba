use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::logger::LogArgument;
use crate::marshal::case::{fold_object, keys_match, CaseInsensitive};
use crate::marshal::error::MarshalError;
use crate::marshal::LOGGER;
use crate::store::{StoreOperationResult, DOC_REF_FIELD};

const PARENT_KEY: &str = "parentDocRef";

/// Reads a store call outcome. Never fails: malformed input yields a bare failure
/// result and the raw payload is logged.
pub fn parse_store_result<T: DeserializeOwned>(raw: &str) -> StoreOperationResult<T> {
    match try_parse_store_result(raw) {
        Ok(result) => result,
        Err(err) => {
            LOGGER.error_with([
                LogArgument::Text(format!("Failed to read store result: {err}")),
                LogArgument::Text(raw.to_string()),
            ]);
            StoreOperationResult::failure()
        }
    }
}

pub fn try_parse_store_result<T: DeserializeOwned>(
    raw: &str,
) -> Result<StoreOperationResult<T>, MarshalError> {
    let Value::Object(fields) = serde_json::from_str::<Value>(raw)? else {
        return Err(MarshalError::shape("store result is not a JSON object"));
    };
    let mut fields = fold_object(fields);

    let success = match fields.remove("success") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => flag,
        Some(other) => {
            return Err(MarshalError::shape(format!(
                "`success` must be a boolean, found {other}"
            )))
        }
    };

    let document = match fields.remove("document") {
        None | Some(Value::Null) => None,
        Some(value) => Some(decode_document::<T>(value)?),
    };

    let document_list = match fields.remove("documentlist") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .map(decode_document::<T>)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(other) => {
            return Err(MarshalError::shape(format!(
                "`documentList` must be an array, found {other}"
            )))
        }
    };

    let error_json = fields
        .remove("errorjsonstr")
        .or_else(|| fields.remove("errorjson"));

    Ok(StoreOperationResult {
        success,
        document,
        document_list,
        error_code: optional_text(fields.remove("errorcode")),
        error_name: optional_text(fields.remove("errorname")),
        error_json: optional_text(error_json),
    })
}

/// Reads a pushed snapshot payload. JSON `null` means the document is gone.
pub fn decode_snapshot<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, MarshalError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Null => Ok(None),
        value => decode_document(value).map(Some),
    }
}

pub(crate) fn decode_document<T: DeserializeOwned>(value: Value) -> Result<T, MarshalError> {
    let value = match value {
        Value::String(encoded) => serde_json::from_str(&encoded)?,
        other => other,
    };
    CaseInsensitive::deserialize(normalize_document(value)).map_err(MarshalError::document::<T>)
}

/// Moves the reference under its canonical key and drops empty parents. Field names
/// are matched against `T` afterwards, without regard to case.
pub(crate) fn normalize_document(value: Value) -> Value {
    let Value::Object(fields) = value else {
        return value;
    };

    let mut normalized = Map::with_capacity(fields.len());
    let mut reference = None;
    for (key, field) in fields {
        if is_reference_key(&key) {
            reference = Some(normalize_reference(field));
        } else {
            normalized.insert(key, field);
        }
    }
    if let Some(reference) = reference {
        normalized.insert(DOC_REF_FIELD.to_string(), reference);
    }
    Value::Object(normalized)
}

/// `DocRef`, `docRef`, `doc_ref` and `DOCREF` all name the reference.
fn is_reference_key(key: &str) -> bool {
    keys_match(key, DOC_REF_FIELD)
}

fn normalize_reference(value: Value) -> Value {
    let Value::Object(fields) = value else {
        return Value::Null;
    };
    if fields.is_empty() {
        return Value::Null;
    }
    let mut reference = Map::with_capacity(fields.len());
    for (key, field) in fields {
        if keys_match(&key, PARENT_KEY) {
            reference.insert(PARENT_KEY.to_string(), normalize_reference(field));
        } else {
            reference.insert(key, field);
        }
    }
    Value::Object(reference)
}

fn optional_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentReference;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Card {
        #[serde(rename = "DocRef", default)]
        doc_ref: Option<DocumentReference>,
        title: String,
        votes: u32,
    }

    #[test]
    fn envelope_keys_match_in_any_casing() {
        let raw = r#"{"SUCCESS":true,"Document":{"DocRef":{"docId":"c1","docPath":"cards/c1","parentDocRef":{}},"Title":"Hi","votes":2},"ErrorCode":null}"#;
        let result = parse_store_result::<Card>(raw);

        assert!(result.success);
        let card = result.document.unwrap();
        assert_eq!(card.title, "Hi");
        let reference = card.doc_ref.unwrap();
        assert_eq!(reference.doc_id, "c1");
        assert_eq!(reference.parent_doc_ref, None);
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn reference_key_matches_insensitively_and_keeps_parents() {
        let raw = json!({
            "success": true,
            "documentList": [{
                "docref": {
                    "DocId": "c1",
                    "DocPath": "users/u1/cards/c1",
                    "ParentDocRef": {"docId": "u1", "docPath": "users/u1", "parentDocRef": {}}
                },
                "Title": "Nested",
                "votes": 0
            }]
        })
        .to_string();

        let result = parse_store_result::<Card>(&raw);
        let cards = result.document_list.unwrap();
        let parent = cards[0].doc_ref.as_ref().unwrap().parent_doc_ref.as_ref().unwrap();
        assert_eq!(parent.doc_path, "users/u1");
        assert_eq!(parent.parent_doc_ref, None);
    }

    #[test]
    fn document_fields_match_in_any_casing() {
        for raw in [
            r#"{"success":true,"document":{"Title":"Read","VOTES":1}}"#,
            r#"{"success":true,"document":{"TITLE":"Read","votes":1}}"#,
        ] {
            let result = parse_store_result::<Card>(raw);
            assert!(result.success, "payload {raw:?}");
            assert_eq!(result.document.unwrap().title, "Read");
        }
    }

    #[test]
    fn declared_renames_still_apply() {
        #[derive(Debug, Deserialize)]
        struct Renamed {
            #[serde(rename = "headline")]
            title: String,
        }

        let raw = r#"{"success":true,"document":{"HEADLINE":"Kept"}}"#;
        let result = parse_store_result::<Renamed>(raw);
        assert_eq!(result.document.unwrap().title, "Kept");
    }

    #[test]
    fn all_caps_and_lowercase_envelope_keys_are_read() {
        let upper = r#"{"SUCCESS":true,"DOCUMENTLIST":[{"title":"a","votes":1}],"ERRORCODE":"x","ERRORNAME":"y","ERRORJSONSTR":"{}"}"#;
        let result = parse_store_result::<Card>(upper);
        assert!(result.success);
        assert_eq!(result.document_list.map(|cards| cards.len()), Some(1));
        assert_eq!(result.error_code.as_deref(), Some("x"));
        assert_eq!(result.error_name.as_deref(), Some("y"));
        assert_eq!(result.error_json.as_deref(), Some("{}"));

        let lower = r#"{"success":false,"documentlist":[],"errorcode":"not-found","error-name":"FirebaseError"}"#;
        let result = parse_store_result::<Card>(lower);
        assert!(!result.success);
        assert_eq!(result.document_list, Some(Vec::new()));
        assert_eq!(result.error_code.as_deref(), Some("not-found"));
        assert_eq!(result.error_name.as_deref(), Some("FirebaseError"));
    }

    #[test]
    fn error_details_are_carried() {
        let raw = r#"{"success":false,"errorCode":"permission-denied","errorName":"FirebaseError","errorJsonStr":"{\"code\":\"permission-denied\"}"}"#;
        let result = parse_store_result::<Card>(raw);

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("permission-denied"));
        assert_eq!(result.error_name.as_deref(), Some("FirebaseError"));
        assert_eq!(
            result.error_json.as_deref(),
            Some("{\"code\":\"permission-denied\"}")
        );
    }

    #[test]
    fn success_without_document_is_empty() {
        let result = parse_store_result::<Card>(r#"{"success":true}"#);
        assert!(result.success);
        assert!(result.document.is_none());
        assert!(result.document_list.is_none());
    }

    #[test]
    fn malformed_payloads_become_bare_failures_and_are_logged() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        LOGGER.set_user_log_handler(move |_, _, args| {
            sink.lock()
                .unwrap()
                .push(crate::logger::build_message(args));
        });

        let payloads = [
            "",
            "not json",
            "[1,2]",
            r#"{"success":"yes"}"#,
            r#"{"success":true,"document":{"votes":"many"}}"#,
        ];
        for raw in payloads {
            let result = parse_store_result::<Card>(raw);
            assert_eq!(result, StoreOperationResult::failure(), "payload {raw:?}");
        }

        LOGGER.clear_user_log_handler();
        let seen = seen.lock().unwrap();
        assert!(seen.iter().any(|line| line.contains("not json")));
        assert!(seen.iter().any(|line| line.contains("\"votes\":\"many\"")));
    }

    #[test]
    fn null_snapshot_means_deleted() {
        assert_eq!(decode_snapshot::<Card>("null").unwrap(), None);

        let card = decode_snapshot::<Card>(r#"{"Title":"Live","votes":3}"#)
            .unwrap()
            .unwrap();
        assert_eq!(card.votes, 3);

        assert!(matches!(
            decode_snapshot::<Card>(r#"{"Title":1}"#),
            Err(MarshalError::Document { .. })
        ));
    }
}
