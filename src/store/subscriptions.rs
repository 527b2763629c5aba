use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::marshal::MarshalError;

/// Decodes a pushed snapshot payload into the subscriber's type and hands it over.
pub(crate) type Deliver = Arc<dyn Fn(&str) -> Result<(), MarshalError> + Send + Sync + 'static>;

pub(crate) struct Subscription {
    pub collection: String,
    pub type_name: &'static str,
    pub deliver: Deliver,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Delivered,
    Unknown,
    Rejected(MarshalError),
}

/// Document subscriptions keyed by document id, the only correlation key a
/// snapshot push carries.
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    entries: Mutex<HashMap<String, Subscription>>,
}

impl SubscriptionRegistry {
    /// Adds the subscription unless one exists for `doc_id`.
    pub fn insert_if_absent(&self, doc_id: &str, subscription: Subscription) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(doc_id) {
            return false;
        }
        entries.insert(doc_id.to_string(), subscription);
        true
    }

    pub fn remove(&self, doc_id: &str) -> Option<Subscription> {
        self.entries.lock().unwrap().remove(doc_id)
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.entries.lock().unwrap().contains_key(doc_id)
    }

    pub fn collection_of(&self, doc_id: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(doc_id)
            .map(|subscription| subscription.collection.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Runs the delivery outside the lock so a callback may (un)subscribe.
    pub fn dispatch(&self, doc_id: &str, raw: &str) -> Dispatch {
        let deliver = {
            let entries = self.entries.lock().unwrap();
            match entries.get(doc_id) {
                Some(subscription) => subscription.deliver.clone(),
                None => return Dispatch::Unknown,
            }
        };
        match deliver(raw) {
            Ok(()) => Dispatch::Delivered,
            Err(err) => Dispatch::Rejected(err),
        }
    }

    pub fn type_name_of(&self, doc_id: &str) -> Option<&'static str> {
        self.entries
            .lock()
            .unwrap()
            .get(doc_id)
            .map(|subscription| subscription.type_name)
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock().unwrap();
        f.debug_map()
            .entries(entries.iter().map(|(doc_id, subscription)| {
                (doc_id, (&subscription.collection, subscription.type_name))
            }))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: Arc<AtomicUsize>) -> Subscription {
        Subscription {
            collection: "cards".into(),
            type_name: "Card",
            deliver: Arc::new(move |raw: &str| {
                if raw == "bad" {
                    return Err(MarshalError::shape("bad payload"));
                }
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        }
    }

    #[test]
    fn first_subscription_wins() {
        let registry = SubscriptionRegistry::default();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        assert!(registry.insert_if_absent("c1", counting(first.clone())));
        assert!(!registry.insert_if_absent("c1", counting(second.clone())));
        assert_eq!(registry.dispatch("c1", "{}"), Dispatch::Delivered);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_and_rejected_pushes() {
        let registry = SubscriptionRegistry::default();
        registry.insert_if_absent("c1", counting(Arc::new(AtomicUsize::new(0))));

        assert_eq!(registry.dispatch("c2", "{}"), Dispatch::Unknown);
        assert!(matches!(registry.dispatch("c1", "bad"), Dispatch::Rejected(_)));

        registry.remove("c1");
        assert_eq!(registry.dispatch("c1", "{}"), Dispatch::Unknown);
        assert!(!registry.contains("c1"));
    }
}
