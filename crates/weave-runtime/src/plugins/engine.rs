//! Engine carrier plugin.
//!
//! Installs the four phase functions from an external [`QueryEngine`] via
//! before-hooks, making it the default engine for every phase. Plugins
//! listed after this one can still override any slot — last writer wins.

use std::sync::Arc;

use async_trait::async_trait;

use weave_core::engine::QueryEngine;
use weave_hooks::contexts::{
    AfterParse, AfterValidate, ExecuteContext, ExecuteHooks, ParseContext, SubscribeContext,
    SubscribeHooks, ValidateContext,
};
use weave_hooks::errors::PluginError;
use weave_hooks::plugin::Plugin;

/// Install `engine`'s parse, validate, execute, and subscribe functions.
#[must_use]
pub fn use_engine(engine: Arc<dyn QueryEngine>) -> EnginePlugin {
    EnginePlugin { engine }
}

/// Plugin produced by [`use_engine`].
pub struct EnginePlugin {
    engine: Arc<dyn QueryEngine>,
}

#[async_trait]
impl Plugin for EnginePlugin {
    fn name(&self) -> &str {
        "engine"
    }

    async fn on_parse(
        &self,
        cx: &mut ParseContext<'_>,
    ) -> Result<Option<AfterParse>, PluginError> {
        let engine = Arc::clone(&self.engine);
        cx.set_parse_fn(Arc::new(move |request| engine.parse(request)));
        Ok(None)
    }

    async fn on_validate(
        &self,
        cx: &mut ValidateContext<'_>,
    ) -> Result<Option<AfterValidate>, PluginError> {
        let engine = Arc::clone(&self.engine);
        cx.set_validate_fn(Arc::new(move |schema, document| {
            engine.validate(schema, document)
        }));
        Ok(None)
    }

    async fn on_execute(
        &self,
        cx: &mut ExecuteContext<'_>,
    ) -> Result<Option<ExecuteHooks>, PluginError> {
        let engine = Arc::clone(&self.engine);
        cx.set_execute_fn(Arc::new(move |args| {
            let engine = Arc::clone(&engine);
            Box::pin(async move { engine.execute(args).await })
        }));
        Ok(None)
    }

    async fn on_subscribe(
        &self,
        cx: &mut SubscribeContext<'_>,
    ) -> Result<Option<SubscribeHooks>, PluginError> {
        let engine = Arc::clone(&self.engine);
        cx.set_subscribe_fn(Arc::new(move |args| {
            let engine = Arc::clone(&engine);
            Box::pin(async move { engine.subscribe(args).await })
        }));
        Ok(None)
    }
}

impl std::fmt::Debug for EnginePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginePlugin").finish()
    }
}
