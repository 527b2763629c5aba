use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::gateway::BridgeTransport;
use crate::bridge::DEFAULT_BRIDGE_ROOT;

/// Transport calling functions of a global object installed by the script-side glue.
///
/// `auth.signOut` under the default root resolves to `globalThis.firebaseBridge.auth.signOut`
/// and is invoked with its parent object as `this`. A returned promise is awaited.
#[derive(Debug, Clone)]
pub struct WebBridgeTransport {
    root: String,
}

impl WebBridgeTransport {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn resolve(&self, operation: &str) -> BridgeResult<(JsValue, Function)> {
        let mut parent: JsValue = js_sys::global().into();
        let mut current = lookup(&parent, &self.root).ok_or_else(|| {
            BridgeError::unavailable(operation, format!("global '{}' is not defined", self.root))
        })?;

        for segment in operation.split('.') {
            let next = lookup(&current, segment).ok_or_else(|| {
                BridgeError::unavailable(
                    operation,
                    format!("'{segment}' is not defined on '{}'", self.root),
                )
            })?;
            parent = current;
            current = next;
        }

        let function = current
            .dyn_into::<Function>()
            .map_err(|_| BridgeError::unavailable(operation, "target is not a function"))?;
        Ok((parent, function))
    }
}

impl Default for WebBridgeTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_ROOT)
    }
}

#[async_trait::async_trait(?Send)]
impl BridgeTransport for WebBridgeTransport {
    async fn call(&self, operation: &str, args: Vec<Value>) -> BridgeResult<Value> {
        let (this, function) = self.resolve(operation)?;

        let js_args = Array::new();
        for arg in &args {
            js_args.push(&to_js(operation, arg)?);
        }

        let returned = function
            .apply(&this, &js_args)
            .map_err(|err| BridgeError::script(operation, js_error_to_string(err)))?;

        let resolved = if returned.is_instance_of::<Promise>() {
            JsFuture::from(Promise::from(returned))
                .await
                .map_err(|err| BridgeError::script(operation, js_error_to_string(err)))?
        } else {
            returned
        };

        from_js(operation, resolved)
    }
}

fn lookup(target: &JsValue, key: &str) -> Option<JsValue> {
    if target.is_null() || target.is_undefined() {
        return None;
    }
    let value = Reflect::get(target, &JsValue::from_str(key)).ok()?;
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(value)
    }
}

fn to_js(operation: &str, value: &Value) -> BridgeResult<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|err| BridgeError::conversion(operation, err.to_string()))
}

fn from_js(operation: &str, value: JsValue) -> BridgeResult<Value> {
    if value.is_null() || value.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| BridgeError::conversion(operation, err.to_string()))
}

fn js_error_to_string(err: JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    js_sys::JSON::stringify(&err)
        .ok()
        .and_then(|text| text.as_string())
        .unwrap_or_else(|| "unknown script error".to_string())
}
