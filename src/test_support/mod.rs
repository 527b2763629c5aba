//! Test utilities shared across crate-level unit tests.

pub mod backend;
pub mod bridge;

pub use backend::FakeBackend;
pub use bridge::{RecordedCall, ScriptedTransport};
