//! Per-request context bag.
//!
//! The context is a key/value store shared by reference across every phase of
//! a request. Plugins extend it during context building and execution; later
//! writes to the same key win. Callers may capture the [`SharedContext`]
//! handle before the bag is fully populated — object identity is stable for
//! the lifetime of the request, so the captured handle observes all later
//! extensions.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Shared handle to a request's [`ContextBag`].
///
/// The `Arc` identity is the context's identity: extension mutates the bag in
/// place and never rebinds the allocation.
pub type SharedContext = Arc<ContextBag>;

/// Append-oriented key/value store for one request.
///
/// Interior mutability lets every phase hook extend the bag through a shared
/// reference. The lock is only held for the duration of a single operation,
/// never across an await point.
#[derive(Default)]
pub struct ContextBag {
    values: RwLock<Map<String, Value>>,
}

impl ContextBag {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bag seeded with initial values.
    #[must_use]
    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Insert a single value. Returns the previous value for the key, if any.
    ///
    /// Later inserts for the same key overwrite earlier ones.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.write().insert(key.into(), value)
    }

    /// Merge a set of values into the bag. Last write wins per key.
    pub fn extend(&self, values: Map<String, Value>) {
        let mut guard = self.values.write();
        for (key, value) in values {
            let _ = guard.insert(key, value);
        }
    }

    /// Replace the bag's contents in place.
    ///
    /// The allocation (and therefore the context's identity) is untouched.
    pub fn set_values(&self, values: Map<String, Value>) {
        *self.values.write() = values;
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Whether the bag holds a value for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Number of entries in the bag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Clone the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().clone()
    }
}

impl fmt::Debug for ContextBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBag")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let bag = ContextBag::new();
        let _ = bag.insert("user", json!("alice"));
        assert_eq!(bag.get("user"), Some(json!("alice")));
    }

    #[test]
    fn test_insert_returns_previous() {
        let bag = ContextBag::new();
        assert!(bag.insert("k", json!(1)).is_none());
        assert_eq!(bag.insert("k", json!(2)), Some(json!(1)));
        assert_eq!(bag.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_extend_last_write_wins() {
        let bag = ContextBag::new();
        let _ = bag.insert("a", json!(1));

        let mut update = Map::new();
        let _ = update.insert("a".to_string(), json!(2));
        let _ = update.insert("b".to_string(), json!(3));
        bag.extend(update);

        assert_eq!(bag.get("a"), Some(json!(2)));
        assert_eq!(bag.get("b"), Some(json!(3)));
    }

    #[test]
    fn test_set_values_replaces_contents() {
        let bag = ContextBag::new();
        let _ = bag.insert("old", json!(true));

        let mut next = Map::new();
        let _ = next.insert("new".to_string(), json!(false));
        bag.set_values(next);

        assert!(!bag.contains_key("old"));
        assert!(bag.contains_key("new"));
    }

    #[test]
    fn test_shared_handle_observes_later_extension() {
        let shared: SharedContext = Arc::new(ContextBag::new());
        let captured = Arc::clone(&shared);

        let _ = shared.insert("late", json!("value"));

        assert!(Arc::ptr_eq(&shared, &captured));
        assert_eq!(captured.get("late"), Some(json!("value")));
    }

    #[test]
    fn test_with_values_seeds_bag() {
        let mut initial = Map::new();
        let _ = initial.insert("seed".to_string(), json!(7));
        let bag = ContextBag::with_values(initial);
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("seed"), Some(json!(7)));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let bag = ContextBag::new();
        let _ = bag.insert("k", json!(1));
        let snap = bag.snapshot();
        let _ = bag.insert("k2", json!(2));
        assert_eq!(snap.len(), 1);
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_empty_bag() {
        let bag = ContextBag::new();
        assert!(bag.is_empty());
        assert_eq!(bag.len(), 0);
        assert!(bag.get("missing").is_none());
    }

    #[test]
    fn test_debug_impl() {
        let bag = ContextBag::new();
        let debug = format!("{bag:?}");
        assert!(debug.contains("ContextBag"));
    }
}
