//! Schema state holder.
//!
//! One shared slot per orchestrator instance holds the current schema.
//! Replacing it notifies every plugin in flattened-list order except the one
//! that triggered the replacement; setting a handle identical to the one
//! already held is a silent no-op. Both rules together keep replacement
//! cycles from looping: a plugin never hears its own change, and a repeated
//! schema never re-fires.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use weave_core::schema::Schema;

use crate::plugin::Plugin;

/// Shared, single-writer slot for the orchestrator's current schema.
#[derive(Default)]
pub struct SchemaHolder {
    current: RwLock<Option<Schema>>,
}

impl SchemaHolder {
    /// Create an empty holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current schema, if one has been set.
    #[must_use]
    pub fn current(&self) -> Option<Schema> {
        self.current.read().clone()
    }

    /// Replace the schema and notify `plugins`.
    ///
    /// Returns `false` without notifying when `schema` is identical (by
    /// handle identity) to the one already held. Otherwise stores it and
    /// invokes `on_schema_change` on every plugin in list order, skipping
    /// `exclude` (the plugin that triggered the replacement).
    ///
    /// Notifications are synchronous: the call returns only after every
    /// plugin has observed the change. A plugin replacing the schema again
    /// from inside its notification triggers a nested dispatch that excludes
    /// that plugin instead.
    pub fn replace(
        &self,
        plugins: &[Arc<dyn Plugin>],
        schema: Schema,
        exclude: Option<usize>,
    ) -> bool {
        {
            let mut guard = self.current.write();
            if let Some(existing) = guard.as_ref() {
                if existing.same_as(&schema) {
                    return false;
                }
            }
            *guard = Some(schema.clone());
        }

        debug!(plugins = plugins.len(), "Schema replaced, notifying plugins");

        for (index, plugin) in plugins.iter().enumerate() {
            if Some(index) == exclude {
                continue;
            }
            let cx = SchemaChangeContext {
                schema: &schema,
                holder: self,
                plugins,
                plugin_index: index,
            };
            plugin.on_schema_change(&cx);
        }

        true
    }
}

impl std::fmt::Debug for SchemaHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaHolder")
            .field("set", &self.current.read().is_some())
            .finish()
    }
}

/// Payload handed to [`Plugin::on_schema_change`].
pub struct SchemaChangeContext<'a> {
    schema: &'a Schema,
    holder: &'a SchemaHolder,
    plugins: &'a [Arc<dyn Plugin>],
    plugin_index: usize,
}

impl SchemaChangeContext<'_> {
    /// The newly installed schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Replace the schema again. The nested change notification excludes the
    /// plugin making this call.
    pub fn replace_schema(&self, schema: Schema) -> bool {
        self.holder
            .replace(self.plugins, schema, Some(self.plugin_index))
    }
}
