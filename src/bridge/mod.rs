//! Boundary call gateway between the Rust host and the page script context.
//!
//! Outbound calls go through [`BridgeGateway`] over a pluggable [`BridgeTransport`];
//! call sites choose a [`RetryPolicy`] per operation. Inbound push events are routed
//! through [`InstanceSlot`]s, see [`crate::host`].

mod entry_points;
mod error;
mod gateway;
mod retry;
#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
mod web;

use std::sync::LazyLock;

use crate::logger::Logger;

pub(crate) static LOGGER: LazyLock<Logger> =
    LazyLock::new(|| Logger::new("@firebase-bridge/bridge"));

/// Global object the script-side glue installs its operations on.
pub const DEFAULT_BRIDGE_ROOT: &str = "firebaseBridge";

/// Global object holding the host entry points the script side calls back into.
pub const HOST_MODULE: &str = "firebaseBridgeHost";

#[doc(inline)]
pub use entry_points::{EntryPointError, InstanceSlot};

#[doc(inline)]
pub use error::{BridgeError, BridgeResult};

#[doc(inline)]
pub use gateway::{BridgeGateway, BridgeTransport};

#[doc(inline)]
pub use retry::{retry, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
#[doc(inline)]
pub use web::WebBridgeTransport;
