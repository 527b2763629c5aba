use std::fmt;
use std::sync::{Arc, Mutex, Weak};

/// Weak back-reference from a fixed-name entry point to the one live instance.
///
/// Push events from the script side carry no instance handle, only the entry point
/// name, so every push-receiving service claims a slot when it is built. The slot
/// never keeps the instance alive; once the instance is dropped, [`InstanceSlot::resolve`]
/// reports absence and a new instance may claim the slot.
pub struct InstanceSlot<T> {
    name: &'static str,
    target: Mutex<Option<Weak<T>>>,
}

impl<T> InstanceSlot<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            target: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers `instance`, failing if another instance is still alive.
    pub fn claim(&self, instance: &Arc<T>) -> Result<(), EntryPointError> {
        let mut target = self.target.lock().unwrap();
        if target.as_ref().and_then(Weak::upgrade).is_some() {
            return Err(EntryPointError::AlreadyClaimed { entry_point: self.name });
        }
        *target = Some(Arc::downgrade(instance));
        Ok(())
    }

    pub fn resolve(&self) -> Option<Arc<T>> {
        self.target.lock().unwrap().as_ref().and_then(Weak::upgrade)
    }
}

impl<T> fmt::Debug for InstanceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceSlot")
            .field("name", &self.name)
            .field("alive", &self.resolve().is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPointError {
    AlreadyClaimed { entry_point: &'static str },
}

impl fmt::Display for EntryPointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPointError::AlreadyClaimed { entry_point } => write!(
                f,
                "Only one live instance may receive '{entry_point}' events"
            ),
        }
    }
}

impl std::error::Error for EntryPointError {}
