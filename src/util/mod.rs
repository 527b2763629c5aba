pub mod subscribe;

pub use subscribe::{Listener, ListenerList, Unsubscribe};
