//! Insertion-ordered, string-keyed side channel for cross-behavior data.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::MediatorError;

/// A stored item value. Type-tagged through `Any`.
pub type ItemValue = Arc<dyn Any + Send + Sync>;

/// Heterogeneous map owned by a single request context.
///
/// Only one dispatch ever touches a given map and it does so sequentially;
/// the mutex exists so the context can be shared by reference across
/// `Send` futures.
#[derive(Default)]
pub(crate) struct ContextItems {
    entries: Mutex<Vec<(String, ItemValue)>>,
}

impl ContextItems {
    /// Inserts or replaces `key`. A replaced key keeps its original position.
    pub(crate) fn insert<T: Any + Send + Sync>(
        &self,
        key: &str,
        value: T,
    ) -> Result<(), MediatorError> {
        if key.trim().is_empty() {
            return Err(MediatorError::InvalidArgument {
                argument: "key",
                reason: "item key must not be blank",
            });
        }
        let value: ItemValue = Arc::new(value);
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key.to_string(), value)),
        }
        Ok(())
    }

    /// Returns a clone of the value under `key` if it is a `T`.
    pub(crate) fn get<T: Any + Clone>(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock();
        entries
            .iter()
            .find(|(existing, _)| existing == key)
            .and_then(|(_, value)| value.downcast_ref::<T>().cloned())
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(existing, _)| existing != key);
        entries.len() != before
    }

    /// Point-in-time copy of all entries in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<(String, ItemValue)> {
        self.entries.lock().clone()
    }
}

impl fmt::Debug for ContextItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_list()
            .entries(entries.iter().map(|(key, _)| key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_same_type() {
        let items = ContextItems::default();
        items.insert("tenant", "acme".to_string()).unwrap();
        assert_eq!(items.get::<String>("tenant"), Some("acme".to_string()));
    }

    #[test]
    fn get_with_other_type_is_none() {
        let items = ContextItems::default();
        items.insert("attempt", 3_u32).unwrap();
        assert_eq!(items.get::<u64>("attempt"), None);
        assert_eq!(items.get::<u32>("attempt"), Some(3));
    }

    #[test]
    fn missing_key_is_none() {
        let items = ContextItems::default();
        assert_eq!(items.get::<u32>("nope"), None);
    }

    #[test]
    fn remove_reports_presence() {
        let items = ContextItems::default();
        items.insert("k", 1_i32).unwrap();
        assert!(items.remove("k"));
        assert!(!items.remove("k"));
        assert_eq!(items.get::<i32>("k"), None);
    }

    #[test]
    fn blank_key_is_rejected() {
        let items = ContextItems::default();
        let err = items.insert("   ", 1_i32).unwrap_err();
        assert!(matches!(
            err,
            MediatorError::InvalidArgument { argument: "key", .. }
        ));
    }

    #[test]
    fn replace_keeps_insertion_position() {
        let items = ContextItems::default();
        items.insert("a", 1_i32).unwrap();
        items.insert("b", 2_i32).unwrap();
        items.insert("a", 10_i32).unwrap();

        let keys: Vec<String> = items.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(items.get::<i32>("a"), Some(10));
    }

    #[test]
    fn debug_lists_keys() {
        let items = ContextItems::default();
        items.insert("first", ()).unwrap();
        assert_eq!(format!("{items:?}"), "[\"first\"]");
    }
}
