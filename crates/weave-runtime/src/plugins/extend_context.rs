//! Context extender plugin.

use async_trait::async_trait;
use serde_json::{Map, Value};

use weave_core::context::SharedContext;
use weave_hooks::contexts::{AfterContextBuilding, ContextBuildingContext};
use weave_hooks::errors::PluginError;
use weave_hooks::plugin::Plugin;

/// Merge caller-provided values into the context during context building.
///
/// The extension closure sees the context as built so far, so values can be
/// derived from entries earlier plugins contributed. Later plugins (and
/// later `use_extend_context` instances) overwrite on key collision.
#[must_use]
pub fn use_extend_context<F>(extension: F) -> ExtendContextPlugin
where
    F: Fn(&SharedContext) -> Map<String, Value> + Send + Sync + 'static,
{
    ExtendContextPlugin {
        extension: Box::new(extension),
    }
}

/// Plugin produced by [`use_extend_context`].
pub struct ExtendContextPlugin {
    extension: Box<dyn Fn(&SharedContext) -> Map<String, Value> + Send + Sync>,
}

#[async_trait]
impl Plugin for ExtendContextPlugin {
    fn name(&self) -> &str {
        "extend-context"
    }

    async fn on_context_building(
        &self,
        cx: &mut ContextBuildingContext<'_>,
    ) -> Result<Option<AfterContextBuilding>, PluginError> {
        let values = (self.extension)(cx.context());
        cx.extend_context(values);
        Ok(None)
    }
}

impl std::fmt::Debug for ExtendContextPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendContextPlugin").finish()
    }
}
