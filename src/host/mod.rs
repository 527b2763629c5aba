//! Fixed-name entry points the script side calls to push events into the host.
//!
//! A push carries no instance handle, only the entry point name. [`EntryPoints`]
//! holds a weak slot per entry point; [`AuthSession`] and [`DocumentStore`] claim
//! theirs when built. Events arriving while no live instance is registered are
//! logged and dropped.

use std::sync::{Arc, LazyLock};

use crate::auth::AuthSession;
use crate::bridge::{BridgeResult, InstanceSlot};
use crate::logger::Logger;
use crate::store::DocumentStore;

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new("@firebase-bridge/host"));

static ENTRY_POINTS: LazyLock<Arc<EntryPoints>> = LazyLock::new(|| Arc::new(EntryPoints::new()));

pub const AUTH_STATE_CALLBACK: &str = "OnAuthStateChangedCallback";
pub const SNAPSHOT_CALLBACK: &str = "OnSnapshotCallback";

#[derive(Debug)]
pub struct EntryPoints {
    auth: InstanceSlot<AuthSession>,
    store: InstanceSlot<DocumentStore>,
}

impl EntryPoints {
    pub const fn new() -> Self {
        Self {
            auth: InstanceSlot::new(AUTH_STATE_CALLBACK),
            store: InstanceSlot::new(SNAPSHOT_CALLBACK),
        }
    }

    pub fn auth(&self) -> &InstanceSlot<AuthSession> {
        &self.auth
    }

    pub fn store(&self) -> &InstanceSlot<DocumentStore> {
        &self.store
    }

    /// Returns whether a live session received the event.
    pub fn dispatch_auth_state(&self, user_json: &str) -> bool {
        match self.auth.resolve() {
            Some(session) => {
                session.handle_auth_state_push(user_json);
                true
            }
            None => {
                LOGGER.warn(format!("{AUTH_STATE_CALLBACK}: no live auth session, dropping event"));
                false
            }
        }
    }

    /// Returns whether a live client received the event; unknown documents are
    /// handled (and dropped) by the client itself.
    pub fn dispatch_snapshot(&self, doc_id: &str, doc_json: &str) -> bool {
        match self.store.resolve() {
            Some(store) => {
                store.handle_snapshot_push(doc_id, doc_json);
                true
            }
            None => {
                LOGGER.warn(format!(
                    "{SNAPSHOT_CALLBACK}: no live document store, dropping event for {doc_id}"
                ));
                false
            }
        }
    }
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide entry points used by the exported callbacks.
pub fn entry_points() -> Arc<EntryPoints> {
    ENTRY_POINTS.clone()
}

/// Body of the `OnAuthStateChangedCallback` entry point.
pub fn on_auth_state_changed_callback(user_json: &str) {
    ENTRY_POINTS.dispatch_auth_state(user_json);
}

/// Body of the `OnSnapshotCallback` entry point.
pub fn on_snapshot_callback(doc_id: &str, doc_json: &str) {
    ENTRY_POINTS.dispatch_snapshot(doc_id, doc_json);
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
mod web {
    use js_sys::{Object, Reflect};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use super::{AUTH_STATE_CALLBACK, LOGGER, SNAPSHOT_CALLBACK};
    use crate::bridge::{BridgeError, BridgeResult, HOST_MODULE};

    #[wasm_bindgen(js_name = OnAuthStateChangedCallback)]
    pub fn on_auth_state_changed(user_json: JsValue) {
        super::on_auth_state_changed_callback(&js_text(&user_json));
    }

    #[wasm_bindgen(js_name = OnSnapshotCallback)]
    pub fn on_snapshot(doc_id: JsValue, doc_json: JsValue) {
        super::on_snapshot_callback(&js_text(&doc_id), &js_text(&doc_json));
    }

    /// Payloads are expected as JSON text; objects are stringified.
    fn js_text(value: &JsValue) -> String {
        if let Some(text) = value.as_string() {
            return text;
        }
        if value.is_undefined() {
            return "null".to_string();
        }
        js_sys::JSON::stringify(value)
            .ok()
            .and_then(|text| text.as_string())
            .unwrap_or_else(|| "null".to_string())
    }

    pub fn install() -> BridgeResult<()> {
        let to_error = |err: JsValue| {
            BridgeError::script(
                "install",
                err.as_string().unwrap_or_else(|| format!("{err:?}")),
            )
        };

        let global: JsValue = js_sys::global().into();
        let mut host = Reflect::get(&global, &JsValue::from_str(HOST_MODULE)).map_err(to_error)?;
        if host.is_undefined() || host.is_null() {
            host = Object::new().into();
            Reflect::set(&global, &JsValue::from_str(HOST_MODULE), &host).map_err(to_error)?;
        }

        let auth = Closure::wrap(Box::new(move |user_json: JsValue| {
            on_auth_state_changed(user_json);
        }) as Box<dyn FnMut(JsValue)>);
        Reflect::set(
            &host,
            &JsValue::from_str(AUTH_STATE_CALLBACK),
            auth.as_ref().unchecked_ref(),
        )
        .map_err(to_error)?;
        // Lives as long as the page.
        auth.forget();

        let snapshot = Closure::wrap(Box::new(move |doc_id: JsValue, doc_json: JsValue| {
            on_snapshot(doc_id, doc_json);
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        Reflect::set(
            &host,
            &JsValue::from_str(SNAPSHOT_CALLBACK),
            snapshot.as_ref().unchecked_ref(),
        )
        .map_err(to_error)?;
        snapshot.forget();

        LOGGER.debug(format!("Entry points installed on {HOST_MODULE}"));
        Ok(())
    }
}

/// Installs the entry points on the global host object the script side calls.
#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub fn install() -> BridgeResult<()> {
    web::install()
}

/// Without a script context there is nothing to install.
#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
pub fn install() -> BridgeResult<()> {
    Ok(())
}
