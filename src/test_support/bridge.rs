use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::bridge::{BridgeResult, BridgeTransport};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub args: Vec<Value>,
}

type Script = Box<dyn Fn(&str, &[Value], usize) -> BridgeResult<Value> + Send + Sync>;

/// Transport answering every call through a closure and recording what was asked.
///
/// The closure receives the operation, its arguments and how many times that operation
/// was called before, which makes "fail N times then succeed" scripts one-liners.
pub struct ScriptedTransport {
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str, &[Value], usize) -> BridgeResult<Value> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }
}

#[async_trait::async_trait]
impl BridgeTransport for ScriptedTransport {
    async fn call(&self, operation: &str, args: Vec<Value>) -> BridgeResult<Value> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let counter = attempts.entry(operation.to_string()).or_insert(0);
            let current = *counter;
            *counter += 1;
            current
        };
        self.calls.lock().unwrap().push(RecordedCall {
            operation: operation.to_string(),
            args: args.clone(),
        });
        (self.script)(operation, &args, attempt)
    }
}
