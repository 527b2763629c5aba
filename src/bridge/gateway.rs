use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::bridge::error::{BridgeError, BridgeResult};
use crate::bridge::retry::{retry, RetryPolicy};

/// Executes a named operation in the script context.
///
/// `operation` is a dotted path relative to the script-side root object, for example
/// `auth.signInWithPopup`. Arguments are positional JSON values. Implementations must
/// report a script side that is not attached yet as [`BridgeError::Unavailable`] so
/// retrying call sites can tell it apart from a script failure.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait BridgeTransport: Send + Sync {
    async fn call(&self, operation: &str, args: Vec<Value>) -> BridgeResult<Value>;
}

/// Generic boundary call gateway shared by every service.
///
/// The gateway never retries on its own; call sites pick between [`BridgeGateway::invoke`]
/// and [`BridgeGateway::invoke_with_retry`] depending on whether the operation is safe to
/// repeat.
#[derive(Clone)]
pub struct BridgeGateway {
    transport: Arc<dyn BridgeTransport>,
}

impl BridgeGateway {
    pub fn new(transport: Arc<dyn BridgeTransport>) -> Self {
        Self { transport }
    }

    /// Gateway backed by the browser script context.
    #[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
    pub fn web() -> Self {
        Self::new(Arc::new(crate::bridge::WebBridgeTransport::default()))
    }

    pub async fn invoke(&self, operation: &str, args: Vec<Value>) -> BridgeResult<Value> {
        self.transport.call(operation, args).await
    }

    pub async fn invoke_with_retry(
        &self,
        operation: &str,
        args: Vec<Value>,
        policy: RetryPolicy,
    ) -> BridgeResult<Value> {
        retry(policy, operation, move || self.invoke(operation, args.clone())).await
    }

    /// Invokes an operation whose result is a JSON document encoded as a string.
    pub async fn invoke_text(&self, operation: &str, args: Vec<Value>) -> BridgeResult<String> {
        let value = self.invoke(operation, args).await?;
        Ok(value_to_text(value))
    }

    pub async fn invoke_text_with_retry(
        &self,
        operation: &str,
        args: Vec<Value>,
        policy: RetryPolicy,
    ) -> BridgeResult<String> {
        let value = self.invoke_with_retry(operation, args, policy).await?;
        Ok(value_to_text(value))
    }

    /// Invokes an operation that answers with a boolean, retrying any failure.
    ///
    /// A non-boolean answer counts as a failed attempt.
    pub async fn invoke_bool_with_retry(
        &self,
        operation: &str,
        args: Vec<Value>,
        policy: RetryPolicy,
    ) -> BridgeResult<bool> {
        retry(policy, operation, move || {
            let args = args.clone();
            async move {
                let value = self.invoke(operation, args).await?;
                value_to_bool(operation, value)
            }
        })
        .await
    }
}

impl fmt::Debug for BridgeGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeGateway").finish_non_exhaustive()
    }
}

/// Script functions are expected to return `JSON.stringify(...)` output, but a plain
/// object is tolerated and re-encoded.
fn value_to_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_bool(operation: &str, value: Value) -> BridgeResult<bool> {
    match value {
        Value::Bool(flag) => Ok(flag),
        Value::String(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(BridgeError::UnexpectedResponse {
            operation: operation.to_string(),
            found: other.to_string(),
        }),
    }
}
