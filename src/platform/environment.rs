//! Runtime environment lookups used while resolving the backend configuration.

use std::env;
use std::fs;

use serde_json::{Map, Value};

/// Returns the parsed `__FIREBASE_DEFAULTS__` object when available.
fn firebase_defaults() -> Option<Value> {
    defaults_from_env()
        .or_else(defaults_from_path)
        .or_else(defaults_from_global)
}

fn defaults_from_env() -> Option<Value> {
    let raw = env::var("__FIREBASE_DEFAULTS__").ok()?;
    parse_json_object(&raw)
}

fn defaults_from_path() -> Option<Value> {
    let path = env::var("__FIREBASE_DEFAULTS_PATH").ok()?;
    let content = fs::read_to_string(path).ok()?;
    parse_json_object(&content)
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn defaults_from_global() -> Option<Value> {
    use wasm_bindgen::JsValue;

    let global = js_sys::global();
    let value = js_sys::Reflect::get(&global, &JsValue::from_str("__FIREBASE_DEFAULTS__")).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let serialized = js_sys::JSON::stringify(&value).ok()?.as_string()?;
    parse_json_object(&serialized)
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
fn defaults_from_global() -> Option<Value> {
    None
}

fn parse_json_object(raw: &str) -> Option<Value> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object)
}

/// Retrieves the default backend configuration as a JSON map when available.
///
/// Looks at `__FIREBASE_DEFAULTS__.config` first (environment variable, file path
/// variable or page global), then at a raw `FIREBASE_CONFIG` JSON object.
pub fn default_backend_config_json() -> Option<Map<String, Value>> {
    if let Some(defaults) = firebase_defaults() {
        if let Some(config) = defaults.get("config").and_then(Value::as_object) {
            return Some(config.clone());
        }
    }

    let raw = env::var("FIREBASE_CONFIG").ok()?;
    parse_json_object(&raw)?.as_object().cloned()
}

/// Origin of the page hosting the module, used to reach the reserved hosting URLs.
#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
pub fn page_origin() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_object_payloads() {
        assert!(parse_json_object("[1, 2]").is_none());
        assert!(parse_json_object("not json").is_none());
        assert_eq!(
            parse_json_object("{\"projectId\":\"demo\"}").unwrap()["projectId"],
            "demo"
        );
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn no_page_origin_outside_the_browser() {
        assert!(page_origin().is_none());
    }
}
