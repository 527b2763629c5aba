use std::fmt;
use std::sync::{Arc, Mutex};

pub type Listener<T> = Arc<dyn Fn(Option<&T>) + Send + Sync + 'static>;

/// Detaches a listener. Calling it after the owner is gone is a no-op.
pub type Unsubscribe = Box<dyn FnOnce() + Send + 'static>;

/// Ordered set of callbacks observing an optional value.
///
/// Listeners run outside the lock, so a callback may subscribe or unsubscribe.
pub struct ListenerList<T> {
    inner: Arc<Mutex<ListenerState<T>>>,
}

struct ListenerState<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

impl<T: 'static> ListenerList<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListenerState {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Unsubscribe
    where
        F: Fn(Option<&T>) + Send + Sync + 'static,
    {
        let id = {
            let mut state = self.inner.lock().unwrap();
            let id = state.next_id;
            state.next_id += 1;
            state.entries.push((id, Arc::new(listener)));
            id
        };

        let state = Arc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().unwrap().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn notify(&self, value: Option<&T>) {
        let listeners: Vec<Listener<T>> = self
            .inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ListenerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.inner.lock().map(|state| state.entries.len()).unwrap_or(0);
        f.debug_struct("ListenerList").field("listeners", &count).finish()
    }
}
