//! Opaque, identity-compared schema handle.
//!
//! The orchestrator never inspects a schema; it only stores the current one
//! and compares handles for identity when a plugin replaces it. The concrete
//! schema type belongs to the underlying query engine, so the handle wraps
//! `Arc<dyn Any>` and exposes a typed [`downcast_ref`](Schema::downcast_ref)
//! for engine code.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Cheap-to-clone handle to an engine-defined schema value.
///
/// Two handles are considered the same schema when they share the same
/// allocation ([`same_as`](Schema::same_as)). Replacing the current schema
/// with an identical handle is a no-op at the schema state holder.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<dyn Any + Send + Sync>,
}

impl Schema {
    /// Wrap an engine schema value.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(schema: T) -> Self {
        Self {
            inner: Arc::new(schema),
        }
    }

    /// Downcast to the concrete schema type, if it matches.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Identity comparison: `true` when both handles share one allocation.
    #[must_use]
    pub fn same_as(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .finish()
    }
}
