//! Fixed-schema plugin.

use async_trait::async_trait;

use weave_core::schema::Schema;
use weave_hooks::errors::PluginError;
use weave_hooks::init::InitContext;
use weave_hooks::plugin::Plugin;

/// Set a fixed schema at orchestrator construction.
///
/// The change notification fires during initialization, reaching the plugins
/// listed before this one.
#[must_use]
pub fn use_schema(schema: Schema) -> SchemaPlugin {
    SchemaPlugin { schema }
}

/// Plugin produced by [`use_schema`].
#[derive(Debug)]
pub struct SchemaPlugin {
    schema: Schema,
}

#[async_trait]
impl Plugin for SchemaPlugin {
    fn name(&self) -> &str {
        "schema"
    }

    fn on_init(&self, cx: &mut InitContext<'_>) -> Result<(), PluginError> {
        let _ = cx.set_schema(self.schema.clone());
        Ok(())
    }
}
