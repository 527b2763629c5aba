use serde_json::Value;

use crate::store::types::DOC_REF_FIELD;

/// Overlays the non-null top-level fields of `incoming` onto `existing`.
///
/// Fields only present in `existing` survive, so applying the same overlay twice
/// gives the same document as applying it once. The reference field is never taken
/// from `incoming`.
pub fn merge_non_null(existing: Value, incoming: Value) -> Value {
    let (Value::Object(mut merged), Value::Object(incoming)) = (existing, incoming) else {
        return Value::Null;
    };
    for (key, value) in incoming {
        if value.is_null() || key == DOC_REF_FIELD {
            continue;
        }
        merged.insert(key, value);
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_fields_do_not_erase() {
        let existing = json!({"uid": "u1", "name": "Ada", "city": "London"});
        let incoming = json!({"uid": "u1", "name": null, "city": "Paris"});

        assert_eq!(
            merge_non_null(existing, incoming),
            json!({"uid": "u1", "name": "Ada", "city": "Paris"})
        );
    }

    #[test]
    fn merging_twice_is_stable() {
        let existing = json!({"uid": "u1", "visits": 1, "theme": "dark"});
        let incoming = json!({"uid": "u1", "visits": 2});

        let once = merge_non_null(existing, incoming.clone());
        let twice = merge_non_null(once.clone(), incoming);
        assert_eq!(once, twice);
        assert_eq!(twice["theme"], "dark");
    }

    #[test]
    fn existing_reference_is_kept() {
        let existing = json!({"DocRef": {"docId": "u1"}, "uid": "u1"});
        let incoming = json!({"DocRef": {"docId": "other"}, "uid": "u1"});
        assert_eq!(merge_non_null(existing, incoming)["DocRef"]["docId"], "u1");
    }

    #[test]
    fn non_objects_do_not_merge() {
        assert_eq!(merge_non_null(json!([1]), json!({"a": 1})), Value::Null);
    }
}
