//! Plugin trait.
//!
//! A plugin is an immutable bundle of optional hooks, one per pipeline
//! phase, plus initialization and schema-change hooks and an optional
//! instrumentation map. The orchestrator never mutates a plugin; per-request
//! state travels through the phase contexts and the after-callbacks a hook
//! returns.

use async_trait::async_trait;

use crate::contexts::{
    AfterContextBuilding, AfterParse, AfterValidate, ContextBuildingContext, ExecuteContext,
    ExecuteHooks, ParseContext, SubscribeContext, SubscribeHooks, ValidateContext,
};
use crate::errors::PluginError;
use crate::init::InitContext;
use crate::instrumentation::Instrumentation;
use crate::schema_state::SchemaChangeContext;

/// A pipeline extension.
///
/// Every hook is optional; the defaults do nothing. Before-hooks run in
/// flattened plugin-list order and are awaited one at a time. An after-
/// callback returned by a before-hook runs in reverse order once the phase
/// function has produced a result.
///
/// # Errors
///
/// A failing [`on_init`](Plugin::on_init) aborts orchestrator construction.
/// A failing before-hook aborts the current phase and propagates to the
/// request caller; nothing is retried.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Runs once while the orchestrator is constructed. May register further
    /// plugins and set the schema.
    fn on_init(&self, _cx: &mut InitContext<'_>) -> Result<(), PluginError> {
        Ok(())
    }

    /// Runs when another plugin replaces the schema. The plugin that
    /// triggered the change does not receive this notification.
    fn on_schema_change(&self, _cx: &SchemaChangeContext<'_>) {}

    /// Before-hook for the parse phase.
    async fn on_parse(
        &self,
        _cx: &mut ParseContext<'_>,
    ) -> Result<Option<AfterParse>, PluginError> {
        Ok(None)
    }

    /// Before-hook for the validate phase.
    async fn on_validate(
        &self,
        _cx: &mut ValidateContext<'_>,
    ) -> Result<Option<AfterValidate>, PluginError> {
        Ok(None)
    }

    /// Before-hook for the context-building phase.
    async fn on_context_building(
        &self,
        _cx: &mut ContextBuildingContext<'_>,
    ) -> Result<Option<AfterContextBuilding>, PluginError> {
        Ok(None)
    }

    /// Before-hook for the execute phase.
    async fn on_execute(
        &self,
        _cx: &mut ExecuteContext<'_>,
    ) -> Result<Option<ExecuteHooks>, PluginError> {
        Ok(None)
    }

    /// Before-hook for the subscribe phase.
    async fn on_subscribe(
        &self,
        _cx: &mut SubscribeContext<'_>,
    ) -> Result<Option<SubscribeHooks>, PluginError> {
        Ok(None)
    }

    /// Instrumentation wrappers contributed by this plugin, collected once
    /// at orchestrator construction.
    fn instrumentation(&self) -> Option<Instrumentation> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weave_core::context::ContextBag;
    use weave_core::request::QueryRequest;

    struct NoopPlugin;

    #[async_trait]
    impl Plugin for NoopPlugin {
        fn name(&self) -> &str {
            "noop"
        }
    }

    #[test]
    fn test_default_instrumentation_is_none() {
        assert!(NoopPlugin.instrumentation().is_none());
    }

    #[tokio::test]
    async fn test_default_parse_hook_returns_none() {
        let request = QueryRequest::new("{ a }");
        let context = Arc::new(ContextBag::new());
        let mut slot = None;
        let mut short = None;
        let mut cx = ParseContext::new(&request, &context, &mut slot, &mut short);

        let after = NoopPlugin.on_parse(&mut cx).await.unwrap();
        assert!(after.is_none());
        assert!(slot.is_none());
    }

    #[tokio::test]
    async fn test_default_context_building_hook_returns_none() {
        let context = Arc::new(ContextBag::new());
        let mut break_requested = false;
        let mut stop_result = None;
        let mut cx =
            ContextBuildingContext::new(&context, &mut break_requested, &mut stop_result);

        let after = NoopPlugin.on_context_building(&mut cx).await.unwrap();
        assert!(after.is_none());
        assert!(!break_requested);
    }
}
