//! Orchestrator construction and per-request entry point.
//!
//! An orchestrator is built once from an ordered plugin list. Construction
//! runs the initializer protocol — disabled entries filtered, `on_init`
//! hooks invoked, dynamic registrations expanded depth-first — and freezes
//! the flattened plugin list, the schema slot, and the composed
//! instrumentation for the orchestrator's lifetime. Per-request state lives
//! in the [`RequestScope`] that [`invoke`](Orchestrator::invoke) returns.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use weave_core::context::ContextBag;
use weave_core::schema::Schema;
use weave_hooks::entry::PluginEntry;
use weave_hooks::errors::InitError;
use weave_hooks::init::initialize_plugins;
use weave_hooks::instrumentation::Instrumentation;
use weave_hooks::plugin::Plugin;
use weave_hooks::schema_state::SchemaHolder;

use crate::scope::RequestScope;

/// Hook orchestration engine for one pipeline.
///
/// Shared, read-mostly state scoped to the instance: the frozen plugin list
/// and the schema slot. Cheap to share behind an `Arc` and to `invoke` once
/// per request.
pub struct Orchestrator {
    plugins: Arc<[Arc<dyn Plugin>]>,
    schema: Arc<SchemaHolder>,
    instrumentation: Arc<Instrumentation>,
}

impl Orchestrator {
    /// Start assembling an orchestrator.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Produce a fresh request scope with an empty initial context.
    ///
    /// Must be called once per incoming request; scopes are never reused.
    #[must_use]
    pub fn invoke(&self) -> RequestScope {
        self.invoke_with(Map::new())
    }

    /// Produce a fresh request scope seeded with initial context values.
    #[must_use]
    pub fn invoke_with(&self, initial: Map<String, Value>) -> RequestScope {
        RequestScope::new(
            Arc::clone(&self.plugins),
            Arc::clone(&self.schema),
            Arc::clone(&self.instrumentation),
            Arc::new(ContextBag::with_values(initial)),
        )
    }

    /// The current schema, if one has been set.
    #[must_use]
    pub fn current_schema(&self) -> Option<Schema> {
        self.schema.current()
    }

    /// Replace the schema at runtime, notifying every plugin.
    ///
    /// Returns `false` (and notifies nobody) when `schema` is identical to
    /// the one already held.
    pub fn replace_schema(&self, schema: Schema) -> bool {
        self.schema.replace(&self.plugins, schema, None)
    }

    /// Names of the flattened plugin list, in dispatch order.
    #[must_use]
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("plugins", &self.plugin_names())
            .field("schema", &self.schema)
            .finish()
    }
}

/// Assembles the plugin list for an [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    entries: Vec<PluginEntry>,
}

impl OrchestratorBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an enabled plugin.
    #[must_use]
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.entries.push(PluginEntry::enabled(plugin));
        self
    }

    /// Append a plugin entry (enabled or disabled).
    #[must_use]
    pub fn entry(mut self, entry: PluginEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Append several entries, preserving their order.
    #[must_use]
    pub fn entries(mut self, entries: impl IntoIterator<Item = PluginEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Run the initializer protocol and freeze the orchestrator.
    ///
    /// # Errors
    ///
    /// Fails fast with [`InitError`] when any plugin's `on_init` fails; no
    /// partial orchestrator is produced.
    pub fn build(self) -> Result<Orchestrator, InitError> {
        let holder = SchemaHolder::new();
        let plugins = initialize_plugins(self.entries, &holder)?;
        let instrumentation =
            Instrumentation::compose(plugins.iter().filter_map(|plugin| plugin.instrumentation()));

        debug!(
            plugins = plugins.len(),
            schema = holder.current().is_some(),
            "Orchestrator constructed"
        );

        Ok(Orchestrator {
            plugins: plugins.into(),
            schema: Arc::new(holder),
            instrumentation: Arc::new(instrumentation),
        })
    }
}
