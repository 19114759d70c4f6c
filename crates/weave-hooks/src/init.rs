//! Plugin initializer.
//!
//! Walks the caller-supplied entry list once at orchestrator construction,
//! invoking each plugin's `on_init` and expanding dynamic registrations
//! depth-first: a plugin added during another plugin's `on_init` is spliced
//! immediately after the inserting plugin — ahead of everything still
//! pending — and initialized before the walk proceeds. The returned list is
//! the flattened order every phase dispatch uses; it never changes after
//! initialization completes.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use weave_core::schema::Schema;

use crate::entry::PluginEntry;
use crate::errors::InitError;
use crate::plugin::Plugin;
use crate::schema_state::SchemaHolder;

/// Capabilities granted to [`Plugin::on_init`].
pub struct InitContext<'a> {
    added: Vec<PluginEntry>,
    initialized: &'a [Arc<dyn Plugin>],
    holder: &'a SchemaHolder,
}

impl InitContext<'_> {
    /// Register another plugin entry. It is spliced immediately after the
    /// current plugin and initialized before any already-pending plugin.
    pub fn add_plugin(&mut self, entry: PluginEntry) {
        self.added.push(entry);
    }

    /// Register another plugin. Shorthand for an enabled
    /// [`add_plugin`](InitContext::add_plugin).
    pub fn add(&mut self, plugin: impl Plugin + 'static) {
        self.add_plugin(PluginEntry::enabled(plugin));
    }

    /// Set the orchestrator's schema. Notifies the plugins initialized so
    /// far — never the caller — and is a no-op for an identical handle.
    pub fn set_schema(&self, schema: Schema) -> bool {
        self.holder.replace(self.initialized, schema, None)
    }

    /// The current schema, if one has been set.
    #[must_use]
    pub fn current_schema(&self) -> Option<Schema> {
        self.holder.current()
    }

    /// The plugins initialized before this one, in flattened order.
    #[must_use]
    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        self.initialized
    }
}

/// Filter disabled entries, run every `on_init`, and return the frozen
/// flattened plugin list.
///
/// # Errors
///
/// Returns the first `on_init` failure as [`InitError::Plugin`]; construction
/// is fail-fast and no partial result is produced.
pub fn initialize_plugins(
    entries: Vec<PluginEntry>,
    holder: &SchemaHolder,
) -> Result<Vec<Arc<dyn Plugin>>, InitError> {
    let mut pending: VecDeque<Arc<dyn Plugin>> = entries
        .into_iter()
        .filter_map(PluginEntry::into_enabled)
        .collect();
    let mut initialized: Vec<Arc<dyn Plugin>> = Vec::with_capacity(pending.len());

    while let Some(plugin) = pending.pop_front() {
        debug!(name = %plugin.name(), "Initializing plugin");

        let mut cx = InitContext {
            added: Vec::new(),
            initialized: &initialized,
            holder,
        };
        plugin.on_init(&mut cx).map_err(|source| InitError::Plugin {
            plugin: plugin.name().to_string(),
            source,
        })?;

        let added = cx.added;
        initialized.push(plugin);

        // Depth-first splice: reversed push_front keeps the added plugins in
        // registration order, ahead of everything already pending.
        for entry in added.into_iter().rev() {
            if let Some(plugin) = entry.into_enabled() {
                pending.push_front(plugin);
            }
        }
    }

    debug!(count = initialized.len(), "Plugin list frozen");
    Ok(initialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PluginError;
    use crate::schema_state::SchemaChangeContext;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    type Names = Arc<Mutex<Vec<String>>>;

    struct Tagged {
        name: String,
    }

    #[async_trait]
    impl Plugin for Tagged {
        fn name(&self) -> &str {
            &self.name
        }
    }

    /// Adds a fixed set of entries during its own `on_init`.
    struct Adder {
        name: String,
        children: Mutex<Vec<PluginEntry>>,
    }

    impl Adder {
        fn new(name: &str, children: Vec<PluginEntry>) -> Self {
            Self {
                name: name.to_string(),
                children: Mutex::new(children),
            }
        }
    }

    #[async_trait]
    impl Plugin for Adder {
        fn name(&self) -> &str {
            &self.name
        }
        fn on_init(&self, cx: &mut InitContext<'_>) -> Result<(), PluginError> {
            for entry in self.children.lock().drain(..) {
                cx.add_plugin(entry);
            }
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn on_init(&self, _cx: &mut InitContext<'_>) -> Result<(), PluginError> {
            Err(PluginError::Internal("nope".to_string()))
        }
    }

    struct SchemaSetter {
        schema: Schema,
    }

    #[async_trait]
    impl Plugin for SchemaSetter {
        fn name(&self) -> &str {
            "schema-setter"
        }
        fn on_init(&self, cx: &mut InitContext<'_>) -> Result<(), PluginError> {
            let _ = cx.set_schema(self.schema.clone());
            Ok(())
        }
    }

    struct ChangeRecorder {
        name: String,
        seen: Names,
    }

    #[async_trait]
    impl Plugin for ChangeRecorder {
        fn name(&self) -> &str {
            &self.name
        }
        fn on_schema_change(&self, _cx: &SchemaChangeContext<'_>) {
            self.seen.lock().push(self.name.clone());
        }
    }

    fn tagged(name: &str) -> PluginEntry {
        PluginEntry::enabled(Tagged {
            name: name.to_string(),
        })
    }

    fn names_of(plugins: &[Arc<dyn Plugin>]) -> Vec<String> {
        plugins.iter().map(|p| p.name().to_string()).collect()
    }

    #[test]
    fn test_plain_list_keeps_order() {
        let holder = SchemaHolder::new();
        let plugins =
            initialize_plugins(vec![tagged("a"), tagged("b"), tagged("c")], &holder).unwrap();
        assert_eq!(names_of(&plugins), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_disabled_entries_filtered() {
        let holder = SchemaHolder::new();
        let plugins = initialize_plugins(
            vec![tagged("a"), PluginEntry::Disabled, tagged("b")],
            &holder,
        )
        .unwrap();
        assert_eq!(names_of(&plugins), vec!["a", "b"]);
    }

    #[test]
    fn test_depth_first_expansion_fixture() {
        // [0, initOf(1, 2), initOf(3, initOf(4), 5), 6] flattens to the
        // depth-first registration order 0, 1, 2, 3, 4, 5, 6 with the adder
        // plugins sitting right before their children.
        let holder = SchemaHolder::new();
        let inner_adder = Adder::new("d", vec![tagged("4")]);
        let entries = vec![
            tagged("0"),
            PluginEntry::enabled(Adder::new("a", vec![tagged("1"), tagged("2")])),
            PluginEntry::enabled(Adder::new(
                "b",
                vec![tagged("3"), PluginEntry::enabled(inner_adder), tagged("5")],
            )),
            tagged("6"),
        ];

        let plugins = initialize_plugins(entries, &holder).unwrap();
        assert_eq!(
            names_of(&plugins),
            vec!["0", "a", "1", "2", "b", "3", "d", "4", "5", "6"]
        );
    }

    #[test]
    fn test_added_plugin_may_add_recursively() {
        let holder = SchemaHolder::new();
        let grandchild = Adder::new("gc", vec![tagged("leaf")]);
        let child = Adder::new("c", vec![PluginEntry::enabled(grandchild)]);
        let root = Adder::new("r", vec![PluginEntry::enabled(child)]);

        let plugins =
            initialize_plugins(vec![PluginEntry::enabled(root), tagged("tail")], &holder).unwrap();
        assert_eq!(names_of(&plugins), vec!["r", "c", "gc", "leaf", "tail"]);
    }

    #[test]
    fn test_failing_init_aborts() {
        let holder = SchemaHolder::new();
        let result = initialize_plugins(
            vec![tagged("a"), PluginEntry::enabled(Failing), tagged("b")],
            &holder,
        );
        let error = result.err().expect("init must fail");
        assert!(error.to_string().contains("failing"));
    }

    #[test]
    fn test_set_schema_notifies_only_earlier_plugins() {
        let holder = SchemaHolder::new();
        let seen: Names = Arc::default();
        let entries = vec![
            PluginEntry::enabled(ChangeRecorder {
                name: "before".to_string(),
                seen: Arc::clone(&seen),
            }),
            PluginEntry::enabled(SchemaSetter {
                schema: Schema::new(1_u8),
            }),
            PluginEntry::enabled(ChangeRecorder {
                name: "after".to_string(),
                seen: Arc::clone(&seen),
            }),
        ];

        let _plugins = initialize_plugins(entries, &holder).unwrap();

        assert_eq!(*seen.lock(), vec!["before"]);
        assert!(holder.current().is_some());
    }

    #[test]
    fn test_no_schema_set_means_no_notifications() {
        let holder = SchemaHolder::new();
        let seen: Names = Arc::default();
        let entries = vec![PluginEntry::enabled(ChangeRecorder {
            name: "r".to_string(),
            seen: Arc::clone(&seen),
        })];

        let _plugins = initialize_plugins(entries, &holder).unwrap();

        assert!(seen.lock().is_empty());
        assert!(holder.current().is_none());
    }

    #[test]
    fn test_init_context_sees_earlier_plugins() {
        struct Inspecting {
            observed: Mutex<usize>,
        }

        #[async_trait]
        impl Plugin for Inspecting {
            fn name(&self) -> &str {
                "inspecting"
            }
            fn on_init(&self, cx: &mut InitContext<'_>) -> Result<(), PluginError> {
                *self.observed.lock() = cx.plugins().len();
                Ok(())
            }
        }

        let holder = SchemaHolder::new();
        let inspecting = Arc::new(Inspecting {
            observed: Mutex::new(usize::MAX),
        });
        let entries = vec![
            tagged("a"),
            tagged("b"),
            PluginEntry::from(Arc::clone(&inspecting) as Arc<dyn Plugin>),
        ];

        let _plugins = initialize_plugins(entries, &holder).unwrap();
        assert_eq!(*inspecting.observed.lock(), 2);
    }
}
