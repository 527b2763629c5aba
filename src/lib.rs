#![doc = include_str!("RUSTDOC.md")]

pub mod auth;
pub mod bootstrap;
pub mod bridge;
pub mod host;
pub mod logger;
pub mod marshal;
pub mod platform;
pub mod services;
pub mod store;
pub mod util;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub mod test_support;
