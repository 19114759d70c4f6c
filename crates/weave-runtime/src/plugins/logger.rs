//! Phase logger plugin.
//!
//! Structured phase-level logging through `tracing`, the same fields the
//! dispatcher itself uses. Useful as a first plugin to see the onion open
//! and close around the other plugins in the list.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use weave_core::result::ExecutionResult;
use weave_hooks::contexts::{
    AfterContextBuilding, AfterParse, AfterValidate, ContextBuildingContext, ExecuteContext,
    ExecuteHooks, ParseContext, StreamHandlers, SubscribeContext, SubscribeHooks, ValidateContext,
};
use weave_hooks::errors::PluginError;
use weave_hooks::plugin::Plugin;

/// Log every phase's start and outcome.
#[must_use]
pub fn use_logger() -> LoggerPlugin {
    LoggerPlugin {}
}

/// Plugin produced by [`use_logger`].
#[derive(Debug)]
pub struct LoggerPlugin {}

#[async_trait]
impl Plugin for LoggerPlugin {
    fn name(&self) -> &str {
        "logger"
    }

    async fn on_parse(
        &self,
        _cx: &mut ParseContext<'_>,
    ) -> Result<Option<AfterParse>, PluginError> {
        debug!("parse started");
        Ok(Some(Box::new(|cx| {
            debug!(ok = cx.result().is_ok(), "parse finished");
        })))
    }

    async fn on_validate(
        &self,
        _cx: &mut ValidateContext<'_>,
    ) -> Result<Option<AfterValidate>, PluginError> {
        debug!("validate started");
        Ok(Some(Box::new(|cx| {
            debug!(errors = cx.result().len(), "validate finished");
        })))
    }

    async fn on_context_building(
        &self,
        _cx: &mut ContextBuildingContext<'_>,
    ) -> Result<Option<AfterContextBuilding>, PluginError> {
        debug!("context building started");
        Ok(Some(Box::new(|cx| {
            debug!(entries = cx.context().len(), "context building finished");
        })))
    }

    async fn on_execute(
        &self,
        _cx: &mut ExecuteContext<'_>,
    ) -> Result<Option<ExecuteHooks>, PluginError> {
        debug!("execute started");
        Ok(Some(ExecuteHooks::on_done(|cx| match cx.result() {
            ExecutionResult::Single(response) => {
                debug!(failed = response.is_failed(), "execute finished");
                None
            }
            ExecutionResult::Stream(_) => Some(stream_logging_handlers("execute")),
        })))
    }

    async fn on_subscribe(
        &self,
        _cx: &mut SubscribeContext<'_>,
    ) -> Result<Option<SubscribeHooks>, PluginError> {
        debug!("subscribe started");
        Ok(Some(SubscribeHooks::on_result(|cx| match cx.result() {
            ExecutionResult::Single(response) => {
                debug!(failed = response.is_failed(), "subscribe finished");
                None
            }
            ExecutionResult::Stream(_) => Some(stream_logging_handlers("subscribe")),
        })))
    }
}

/// Count streamed items and log the total when the stream ends.
fn stream_logging_handlers(phase: &'static str) -> StreamHandlers {
    let items = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&items);
    StreamHandlers::new()
        .with_on_next(move |_response| {
            let _ = counter.fetch_add(1, Ordering::Relaxed);
        })
        .with_on_end(move || {
            debug!(phase, items = items.load(Ordering::Relaxed), "stream ended");
        })
}
