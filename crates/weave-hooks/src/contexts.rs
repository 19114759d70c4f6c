//! Phase hook contexts.
//!
//! Each before-hook receives a context struct carrying the capabilities that
//! phase grants: replace the phase function, extend the shared request
//! context, short-circuit the phase, or replace the schema. Contexts borrow
//! the dispatcher's per-call state; nothing here is retained past the phase.
//!
//! After-callbacks are plain `FnOnce` mutators. They run in reverse
//! registration order, each seeing the result as left by the callback before
//! it (registration order being plugin-list order, so the first plugin's
//! callback runs last).

use std::sync::Arc;

use serde_json::{Map, Value};

use weave_core::context::SharedContext;
use weave_core::engine::{ExecuteFn, ExecutionArgs, ParseFn, SubscribeFn, ValidateFn};
use weave_core::request::{Document, QueryRequest};
use weave_core::response::{QueryError, Response};
use weave_core::result::ExecutionResult;
use weave_core::schema::Schema;

use crate::plugin::Plugin;
use crate::schema_state::SchemaHolder;

// ─────────────────────────────────────────────────────────────────────────────
// Parse
// ─────────────────────────────────────────────────────────────────────────────

/// Capabilities granted to `on_parse` before-hooks.
pub struct ParseContext<'a> {
    request: &'a QueryRequest,
    context: &'a SharedContext,
    parse_fn: &'a mut Option<ParseFn>,
    short_circuit: &'a mut Option<Document>,
}

impl<'a> ParseContext<'a> {
    /// Assemble a parse context. Called by the dispatcher.
    pub fn new(
        request: &'a QueryRequest,
        context: &'a SharedContext,
        parse_fn: &'a mut Option<ParseFn>,
        short_circuit: &'a mut Option<Document>,
    ) -> Self {
        Self {
            request,
            context,
            parse_fn,
            short_circuit,
        }
    }

    /// The incoming request.
    #[must_use]
    pub fn request(&self) -> &QueryRequest {
        self.request
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        self.context
    }

    /// Replace the parse function for this call. Last writer wins; the
    /// dispatcher reads the slot after every before-hook has run.
    pub fn set_parse_fn(&mut self, parse_fn: ParseFn) {
        *self.parse_fn = Some(parse_fn);
    }

    /// Provide the parsed document directly, skipping the parse function.
    /// Remaining before-hooks still run.
    pub fn set_parsed_document(&mut self, document: Document) {
        *self.short_circuit = Some(document);
    }
}

/// After-callback for the parse phase.
pub type AfterParse = Box<dyn FnOnce(&mut AfterParseContext<'_>) + Send>;

/// Result view handed to parse after-callbacks.
pub struct AfterParseContext<'a> {
    result: &'a mut Result<Document, QueryError>,
    context: &'a SharedContext,
}

impl<'a> AfterParseContext<'a> {
    /// Assemble an after-parse context. Called by the dispatcher.
    pub fn new(result: &'a mut Result<Document, QueryError>, context: &'a SharedContext) -> Self {
        Self { result, context }
    }

    /// The parse outcome as left by later plugins' callbacks.
    #[must_use]
    pub fn result(&self) -> &Result<Document, QueryError> {
        self.result
    }

    /// Replace the parse outcome before earlier plugins' callbacks see it.
    pub fn replace_result(&mut self, result: Result<Document, QueryError>) {
        *self.result = result;
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        self.context
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validate
// ─────────────────────────────────────────────────────────────────────────────

/// Capabilities granted to `on_validate` before-hooks.
pub struct ValidateContext<'a> {
    schema: &'a Schema,
    document: &'a Document,
    context: &'a SharedContext,
    validate_fn: &'a mut Option<ValidateFn>,
    short_circuit: &'a mut Option<Vec<QueryError>>,
}

impl<'a> ValidateContext<'a> {
    /// Assemble a validate context. Called by the dispatcher.
    pub fn new(
        schema: &'a Schema,
        document: &'a Document,
        context: &'a SharedContext,
        validate_fn: &'a mut Option<ValidateFn>,
        short_circuit: &'a mut Option<Vec<QueryError>>,
    ) -> Self {
        Self {
            schema,
            document,
            context,
            validate_fn,
            short_circuit,
        }
    }

    /// Schema in effect for this request.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Document being validated.
    #[must_use]
    pub fn document(&self) -> &Document {
        self.document
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        self.context
    }

    /// Replace the validate function for this call. Last writer wins.
    pub fn set_validate_fn(&mut self, validate_fn: ValidateFn) {
        *self.validate_fn = Some(validate_fn);
    }

    /// Provide the validation verdict directly, skipping the validate
    /// function. Remaining before-hooks still run.
    pub fn set_validation_result(&mut self, errors: Vec<QueryError>) {
        *self.short_circuit = Some(errors);
    }
}

/// After-callback for the validate phase.
pub type AfterValidate = Box<dyn FnOnce(&mut AfterValidateContext<'_>) + Send>;

/// Result view handed to validate after-callbacks.
pub struct AfterValidateContext<'a> {
    result: &'a mut Vec<QueryError>,
    context: &'a SharedContext,
}

impl<'a> AfterValidateContext<'a> {
    /// Assemble an after-validate context. Called by the dispatcher.
    pub fn new(result: &'a mut Vec<QueryError>, context: &'a SharedContext) -> Self {
        Self { result, context }
    }

    /// The validation errors as left by later plugins' callbacks.
    #[must_use]
    pub fn result(&self) -> &[QueryError] {
        self.result
    }

    /// Whether the document is currently considered valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.result.is_empty()
    }

    /// Replace the validation verdict.
    pub fn replace_result(&mut self, errors: Vec<QueryError>) {
        *self.result = errors;
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        self.context
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context building
// ─────────────────────────────────────────────────────────────────────────────

/// Capabilities granted to `on_context_building` before-hooks.
pub struct ContextBuildingContext<'a> {
    context: &'a SharedContext,
    break_requested: &'a mut bool,
    stop_result: &'a mut Option<ExecutionResult>,
}

impl<'a> ContextBuildingContext<'a> {
    /// Assemble a context-building context. Called by the dispatcher.
    pub fn new(
        context: &'a SharedContext,
        break_requested: &'a mut bool,
        stop_result: &'a mut Option<ExecutionResult>,
    ) -> Self {
        Self {
            context,
            break_requested,
            stop_result,
        }
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        self.context
    }

    /// Merge values into the shared context. Last write wins per key; the
    /// bag's identity is untouched.
    pub fn extend_context(&self, values: Map<String, Value>) {
        self.context.extend(values);
    }

    /// Replace the context's contents in place. Identity is untouched.
    pub fn set_context(&self, values: Map<String, Value>) {
        self.context.set_values(values);
    }

    /// Skip every remaining context-building hook for this request.
    pub fn break_context_building(&mut self) {
        *self.break_requested = true;
    }

    /// Set the final execution result and stop: remaining context-building
    /// hooks are skipped and the execute phase will return this result
    /// without invoking the execute function.
    pub fn set_result_and_stop(&mut self, result: ExecutionResult) {
        *self.stop_result = Some(result);
        *self.break_requested = true;
    }
}

/// After-callback for the context-building phase.
pub type AfterContextBuilding = Box<dyn FnOnce(&mut AfterContextBuildingContext<'_>) + Send>;

/// View handed to context-building after-callbacks.
pub struct AfterContextBuildingContext<'a> {
    context: &'a SharedContext,
}

impl<'a> AfterContextBuildingContext<'a> {
    /// Assemble an after-context-building context. Called by the dispatcher.
    pub fn new(context: &'a SharedContext) -> Self {
        Self { context }
    }

    /// The fully built shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        self.context
    }

    /// Merge values into the shared context.
    pub fn extend_context(&self, values: Map<String, Value>) {
        self.context.extend(values);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Execute / Subscribe
// ─────────────────────────────────────────────────────────────────────────────

/// Capabilities granted to `on_execute` before-hooks.
pub struct ExecuteContext<'a> {
    args: &'a mut ExecutionArgs,
    execute_fn: &'a mut Option<ExecuteFn>,
    short_circuit: &'a mut Option<ExecutionResult>,
    holder: &'a SchemaHolder,
    plugins: &'a [Arc<dyn Plugin>],
    plugin_index: usize,
}

impl<'a> ExecuteContext<'a> {
    /// Assemble an execute context. Called by the dispatcher.
    pub fn new(
        args: &'a mut ExecutionArgs,
        execute_fn: &'a mut Option<ExecuteFn>,
        short_circuit: &'a mut Option<ExecutionResult>,
        holder: &'a SchemaHolder,
        plugins: &'a [Arc<dyn Plugin>],
        plugin_index: usize,
    ) -> Self {
        Self {
            args,
            execute_fn,
            short_circuit,
            holder,
            plugins,
            plugin_index,
        }
    }

    /// Execution arguments as currently assembled.
    #[must_use]
    pub fn args(&self) -> &ExecutionArgs {
        self.args
    }

    /// Mutable execution arguments, for rewriting variables or the document.
    pub fn args_mut(&mut self) -> &mut ExecutionArgs {
        self.args
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        &self.args.context
    }

    /// Merge values into the shared context.
    pub fn extend_context(&self, values: Map<String, Value>) {
        self.args.context.extend(values);
    }

    /// Replace the execute function for this call. Last writer wins.
    pub fn set_execute_fn(&mut self, execute_fn: ExecuteFn) {
        *self.execute_fn = Some(execute_fn);
    }

    /// Set the final result and stop: remaining before-hooks and the execute
    /// function are skipped. After-callbacks already collected still observe
    /// the result.
    pub fn set_result_and_stop(&mut self, result: ExecutionResult) {
        *self.short_circuit = Some(result);
    }

    /// Replace the orchestrator's schema. Every other plugin is notified
    /// synchronously; setting the identical schema is a no-op.
    pub fn replace_schema(&self, schema: Schema) -> bool {
        self.holder
            .replace(self.plugins, schema, Some(self.plugin_index))
    }
}

/// Capabilities granted to `on_subscribe` before-hooks.
pub struct SubscribeContext<'a> {
    args: &'a mut ExecutionArgs,
    subscribe_fn: &'a mut Option<SubscribeFn>,
    short_circuit: &'a mut Option<ExecutionResult>,
    holder: &'a SchemaHolder,
    plugins: &'a [Arc<dyn Plugin>],
    plugin_index: usize,
}

impl<'a> SubscribeContext<'a> {
    /// Assemble a subscribe context. Called by the dispatcher.
    pub fn new(
        args: &'a mut ExecutionArgs,
        subscribe_fn: &'a mut Option<SubscribeFn>,
        short_circuit: &'a mut Option<ExecutionResult>,
        holder: &'a SchemaHolder,
        plugins: &'a [Arc<dyn Plugin>],
        plugin_index: usize,
    ) -> Self {
        Self {
            args,
            subscribe_fn,
            short_circuit,
            holder,
            plugins,
            plugin_index,
        }
    }

    /// Execution arguments as currently assembled.
    #[must_use]
    pub fn args(&self) -> &ExecutionArgs {
        self.args
    }

    /// Mutable execution arguments.
    pub fn args_mut(&mut self) -> &mut ExecutionArgs {
        self.args
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        &self.args.context
    }

    /// Merge values into the shared context.
    pub fn extend_context(&self, values: Map<String, Value>) {
        self.args.context.extend(values);
    }

    /// Replace the subscribe function for this call. Last writer wins.
    pub fn set_subscribe_fn(&mut self, subscribe_fn: SubscribeFn) {
        *self.subscribe_fn = Some(subscribe_fn);
    }

    /// Set the final result and stop, as in
    /// [`ExecuteContext::set_result_and_stop`].
    pub fn set_result_and_stop(&mut self, result: ExecutionResult) {
        *self.short_circuit = Some(result);
    }

    /// Replace the orchestrator's schema, excluding this plugin from the
    /// change notification.
    pub fn replace_schema(&self, schema: Schema) -> bool {
        self.holder
            .replace(self.plugins, schema, Some(self.plugin_index))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Done hooks (execute/subscribe results)
// ─────────────────────────────────────────────────────────────────────────────

/// Per-item mutator for streamed results.
pub type OnNext = Box<dyn FnMut(&mut Response) + Send>;

/// End-of-stream callback. Fires exactly once: on completion, on error, or
/// on early consumer teardown.
pub type OnEnd = Box<dyn FnOnce() + Send>;

/// Result callback returned by execute/subscribe before-hooks.
///
/// For a single result the callback observes (and may replace) the response
/// through the [`DoneContext`]. For a streamed result it may additionally
/// return [`StreamHandlers`] whose `on_next` runs once per streamed value and
/// whose `on_end` runs exactly once at end of stream. For single results any
/// returned `on_next` is invoked once with the response; `on_end` applies to
/// streams only.
pub type OnDone = Box<dyn FnOnce(&mut DoneContext<'_>) -> Option<StreamHandlers> + Send>;

/// Result view handed to [`OnDone`] callbacks.
pub struct DoneContext<'a> {
    result: &'a mut ExecutionResult,
    context: &'a SharedContext,
}

impl<'a> DoneContext<'a> {
    /// Assemble a done context. Called by the result interceptor.
    pub fn new(result: &'a mut ExecutionResult, context: &'a SharedContext) -> Self {
        Self { result, context }
    }

    /// The execution result as left by later plugins' callbacks.
    #[must_use]
    pub fn result(&self) -> &ExecutionResult {
        self.result
    }

    /// Whether the result is a stream.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.result.is_stream()
    }

    /// Mutable access to the single response, when that is the shape.
    pub fn response_mut(&mut self) -> Option<&mut Response> {
        match self.result {
            ExecutionResult::Single(response) => Some(response),
            ExecutionResult::Stream(_) => None,
        }
    }

    /// Replace the whole result (either shape).
    pub fn set_result(&mut self, result: ExecutionResult) {
        *self.result = result;
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        self.context
    }
}

/// Stream handlers registered by an [`OnDone`] callback.
#[derive(Default)]
pub struct StreamHandlers {
    /// Mutator invoked once per streamed value.
    pub on_next: Option<OnNext>,
    /// Callback invoked exactly once when the stream ends or is torn down.
    pub on_end: Option<OnEnd>,
}

impl StreamHandlers {
    /// Create an empty handler set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a per-item mutator.
    #[must_use]
    pub fn with_on_next(mut self, on_next: impl FnMut(&mut Response) + Send + 'static) -> Self {
        self.on_next = Some(Box::new(on_next));
        self
    }

    /// Attach an end-of-stream callback.
    #[must_use]
    pub fn with_on_end(mut self, on_end: impl FnOnce() + Send + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }
}

/// Hooks returned by an `on_execute` before-hook.
#[derive(Default)]
pub struct ExecuteHooks {
    /// Invoked with the execution result after the execute function ran.
    pub on_execute_done: Option<OnDone>,
}

impl ExecuteHooks {
    /// Hooks with an `on_execute_done` callback.
    #[must_use]
    pub fn on_done(
        f: impl FnOnce(&mut DoneContext<'_>) -> Option<StreamHandlers> + Send + 'static,
    ) -> Self {
        Self {
            on_execute_done: Some(Box::new(f)),
        }
    }
}

/// Hooks returned by an `on_subscribe` before-hook.
#[derive(Default)]
pub struct SubscribeHooks {
    /// Invoked with the subscription result after the subscribe function ran.
    pub on_subscribe_result: Option<OnDone>,
}

impl SubscribeHooks {
    /// Hooks with an `on_subscribe_result` callback.
    #[must_use]
    pub fn on_result(
        f: impl FnOnce(&mut DoneContext<'_>) -> Option<StreamHandlers> + Send + 'static,
    ) -> Self {
        Self {
            on_subscribe_result: Some(Box::new(f)),
        }
    }
}
