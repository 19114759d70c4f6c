//! Per-request dispatch scope.
//!
//! [`Orchestrator::invoke`](crate::orchestrator::Orchestrator::invoke)
//! produces one [`RequestScope`] per incoming request. The scope owns the
//! request's context bag, the context-built flag, and the stop-execution
//! result; phase function slots are per-call cells created at dispatch and
//! read only after every before-hook has run.
//!
//! Each phase method runs the same protocol:
//!
//! 1. **Before**: every plugin's before-hook, in flattened-list order, each
//!    awaited before the next starts. Hooks write the function slot, extend
//!    the context, or short-circuit via their phase context.
//! 2. **Invoke**: whatever function is in the slot after all writes.
//! 3. **After**: collected after-callbacks in reverse registration order,
//!    each able to replace the result before the next one sees it.
//!
//! The whole protocol executes inside the composed instrumentation wrapper
//! for the phase when one exists; an uninstrumented phase is dispatched
//! directly with no added indirection.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, instrument};

use weave_core::context::SharedContext;
use weave_core::engine::{ExecuteFn, ExecutionArgs, ParseFn, SubscribeFn, ValidateFn};
use weave_core::request::{Document, QueryRequest};
use weave_core::response::QueryError;
use weave_core::result::ExecutionResult;
use weave_core::schema::Schema;
use weave_hooks::contexts::{
    AfterContextBuilding, AfterContextBuildingContext, AfterParse, AfterParseContext,
    AfterValidate, AfterValidateContext, ContextBuildingContext, ExecuteContext, OnDone,
    ParseContext, SubscribeContext, ValidateContext,
};
use weave_hooks::instrumentation::{Instrumentation, InstrumentScope, Phase, PhaseFuture};
use weave_hooks::plugin::Plugin;
use weave_hooks::schema_state::SchemaHolder;

use crate::errors::{OrchestratorError, UsageError};
use crate::interceptor::apply_done_hooks;

/// Request-scoped dispatch state and the five phase entry points.
///
/// A scope belongs to exactly one in-flight request and is never shared
/// across requests; its context bag and stop flag are isolated by
/// construction.
pub struct RequestScope {
    plugins: Arc<[Arc<dyn Plugin>]>,
    schema: Arc<SchemaHolder>,
    instrumentation: Arc<Instrumentation>,
    context: SharedContext,
    context_built: bool,
    stop_result: Option<ExecutionResult>,
}

impl RequestScope {
    pub(crate) fn new(
        plugins: Arc<[Arc<dyn Plugin>]>,
        schema: Arc<SchemaHolder>,
        instrumentation: Arc<Instrumentation>,
        context: SharedContext,
    ) -> Self {
        Self {
            plugins,
            schema,
            instrumentation,
            context,
            context_built: false,
            stop_result: None,
        }
    }

    /// The request's shared context bag.
    #[must_use]
    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// The orchestrator's current schema.
    #[must_use]
    pub fn current_schema(&self) -> Option<Schema> {
        self.schema.current()
    }

    /// Whether [`build_context`](RequestScope::build_context) has completed.
    #[must_use]
    pub fn context_built(&self) -> bool {
        self.context_built
    }

    /// Run the parse phase for `request`.
    ///
    /// # Errors
    ///
    /// Fails on a plugin hook error, a missing parse function, or an engine
    /// parse error no after-callback recovered.
    #[instrument(skip_all, fields(phase = "parse"))]
    pub async fn parse(&self, request: &QueryRequest) -> Result<Document, OrchestratorError> {
        let inner = dispatch_parse(
            Arc::clone(&self.plugins),
            Arc::clone(&self.context),
            request.clone(),
        );
        self.instrumented(Phase::Parse, inner).await
    }

    /// Run the validate phase for `document`.
    ///
    /// Returns the validation errors; an empty vec means valid.
    ///
    /// # Errors
    ///
    /// Fails on a plugin hook error, a missing schema, or a missing validate
    /// function.
    #[instrument(skip_all, fields(phase = "validate"))]
    pub async fn validate(
        &self,
        document: &Document,
    ) -> Result<Vec<QueryError>, OrchestratorError> {
        let inner = dispatch_validate(
            Arc::clone(&self.plugins),
            Arc::clone(&self.schema),
            Arc::clone(&self.context),
            document.clone(),
        );
        self.instrumented(Phase::Validate, inner).await
    }

    /// Run the context-building phase (the context factory).
    ///
    /// Returns the shared context bag — the same handle
    /// [`context`](RequestScope::context) exposes, fully populated.
    ///
    /// # Errors
    ///
    /// Fails on a plugin hook error.
    #[instrument(skip_all, fields(phase = "context_building"))]
    pub async fn build_context(&mut self) -> Result<SharedContext, OrchestratorError> {
        let inner = dispatch_context_building(
            Arc::clone(&self.plugins),
            Arc::clone(&self.context),
        );
        let stop_result = self.instrumented(Phase::ContextBuilding, inner).await?;
        self.context_built = true;
        if stop_result.is_some() {
            debug!("context building requested execution stop");
            self.stop_result = stop_result;
        }
        Ok(Arc::clone(&self.context))
    }

    /// Run the execute phase for a parsed document.
    ///
    /// # Errors
    ///
    /// Fails on a plugin hook error, a missing execute function, or a
    /// result-setting short-circuit used before
    /// [`build_context`](RequestScope::build_context) ran.
    #[instrument(skip_all, fields(phase = "execute"))]
    pub async fn execute(
        &mut self,
        document: Document,
        request: &QueryRequest,
    ) -> Result<ExecutionResult, OrchestratorError> {
        let args = self.execution_args(document, request);
        let inner = dispatch_execute(
            Arc::clone(&self.plugins),
            Arc::clone(&self.schema),
            args,
            self.context_built,
            self.stop_result.take(),
        );
        self.instrumented(Phase::Execute, inner).await
    }

    /// Run the subscribe phase for a parsed document.
    ///
    /// # Errors
    ///
    /// Same contract as [`execute`](RequestScope::execute), for the
    /// subscribe slot and hooks.
    #[instrument(skip_all, fields(phase = "subscribe"))]
    pub async fn subscribe(
        &mut self,
        document: Document,
        request: &QueryRequest,
    ) -> Result<ExecutionResult, OrchestratorError> {
        let args = self.execution_args(document, request);
        let inner = dispatch_subscribe(
            Arc::clone(&self.plugins),
            Arc::clone(&self.schema),
            args,
            self.context_built,
            self.stop_result.take(),
        );
        self.instrumented(Phase::Subscribe, inner).await
    }

    fn execution_args(&self, document: Document, request: &QueryRequest) -> ExecutionArgs {
        ExecutionArgs {
            schema: self.schema.current(),
            document,
            operation_name: request.operation_name.clone(),
            variables: request.variables.clone(),
            context: Arc::clone(&self.context),
        }
    }

    /// Run `inner` through the composed instrumentation wrapper for `phase`,
    /// or directly when the phase is uninstrumented.
    async fn instrumented<T: Send + 'static>(
        &self,
        phase: Phase,
        inner: impl Future<Output = Result<T, OrchestratorError>> + Send + 'static,
    ) -> Result<T, OrchestratorError> {
        let Some(wrapper) = self.instrumentation.for_phase(phase).cloned() else {
            return inner.await;
        };

        let scope = InstrumentScope {
            phase,
            context: Arc::clone(&self.context),
        };
        let slot: Arc<Mutex<Option<Result<T, OrchestratorError>>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        let terminal: PhaseFuture = Box::pin(async move {
            let out = inner.await;
            *sink.lock() = Some(out);
            Ok(())
        });

        wrapper(scope, terminal).await?;

        let out = slot.lock().take();
        out.unwrap_or_else(|| Err(UsageError::PhaseSkippedByInstrument { phase }.into()))
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("plugins", &self.plugins.len())
            .field("context_built", &self.context_built)
            .field("stopped", &self.stop_result.is_some())
            .finish()
    }
}

async fn dispatch_parse(
    plugins: Arc<[Arc<dyn Plugin>]>,
    context: SharedContext,
    request: QueryRequest,
) -> Result<Document, OrchestratorError> {
    let mut parse_fn: Option<ParseFn> = None;
    let mut short_circuit: Option<Document> = None;
    let mut after_hooks: Vec<AfterParse> = Vec::new();

    for plugin in plugins.iter() {
        let mut cx = ParseContext::new(&request, &context, &mut parse_fn, &mut short_circuit);
        if let Some(after) = plugin.on_parse(&mut cx).await? {
            after_hooks.push(after);
        }
    }

    let mut result = match short_circuit {
        Some(document) => {
            debug!("parse short-circuited by plugin-provided document");
            Ok(document)
        }
        None => {
            let parse = parse_fn.ok_or(UsageError::MissingPhaseFn {
                phase: Phase::Parse,
            })?;
            parse(&request)
        }
    };

    for after in after_hooks.into_iter().rev() {
        let mut cx = AfterParseContext::new(&mut result, &context);
        after(&mut cx);
    }

    result.map_err(OrchestratorError::Parse)
}

async fn dispatch_validate(
    plugins: Arc<[Arc<dyn Plugin>]>,
    holder: Arc<SchemaHolder>,
    context: SharedContext,
    document: Document,
) -> Result<Vec<QueryError>, OrchestratorError> {
    let schema = holder.current().ok_or(UsageError::MissingSchema)?;

    let mut validate_fn: Option<ValidateFn> = None;
    let mut short_circuit: Option<Vec<QueryError>> = None;
    let mut after_hooks: Vec<AfterValidate> = Vec::new();

    for plugin in plugins.iter() {
        let mut cx = ValidateContext::new(
            &schema,
            &document,
            &context,
            &mut validate_fn,
            &mut short_circuit,
        );
        if let Some(after) = plugin.on_validate(&mut cx).await? {
            after_hooks.push(after);
        }
    }

    let mut result = match short_circuit {
        Some(errors) => {
            debug!(errors = errors.len(), "validate short-circuited");
            errors
        }
        None => {
            let validate = validate_fn.ok_or(UsageError::MissingPhaseFn {
                phase: Phase::Validate,
            })?;
            validate(&schema, &document)
        }
    };

    for after in after_hooks.into_iter().rev() {
        let mut cx = AfterValidateContext::new(&mut result, &context);
        after(&mut cx);
    }

    Ok(result)
}

async fn dispatch_context_building(
    plugins: Arc<[Arc<dyn Plugin>]>,
    context: SharedContext,
) -> Result<Option<ExecutionResult>, OrchestratorError> {
    let mut break_requested = false;
    let mut stop_result: Option<ExecutionResult> = None;
    let mut after_hooks: Vec<AfterContextBuilding> = Vec::new();

    for plugin in plugins.iter() {
        let mut cx =
            ContextBuildingContext::new(&context, &mut break_requested, &mut stop_result);
        if let Some(after) = plugin.on_context_building(&mut cx).await? {
            after_hooks.push(after);
        }
        if break_requested {
            debug!(plugin = %plugin.name(), "context building broken");
            break;
        }
    }

    for after in after_hooks.into_iter().rev() {
        let mut cx = AfterContextBuildingContext::new(&context);
        after(&mut cx);
    }

    Ok(stop_result)
}

async fn dispatch_execute(
    plugins: Arc<[Arc<dyn Plugin>]>,
    holder: Arc<SchemaHolder>,
    mut args: ExecutionArgs,
    context_built: bool,
    pre_empted: Option<ExecutionResult>,
) -> Result<ExecutionResult, OrchestratorError> {
    let context = Arc::clone(&args.context);

    // A context-building hook already produced the final result.
    if let Some(result) = pre_empted {
        debug!("execute pre-empted during context building");
        return Ok(result);
    }

    let mut execute_fn: Option<ExecuteFn> = None;
    let mut short_circuit: Option<ExecutionResult> = None;
    let mut done_hooks: Vec<OnDone> = Vec::new();
    let mut stopped_by: Option<String> = None;

    for (index, plugin) in plugins.iter().enumerate() {
        let mut cx = ExecuteContext::new(
            &mut args,
            &mut execute_fn,
            &mut short_circuit,
            &holder,
            &plugins,
            index,
        );
        if let Some(hooks) = plugin.on_execute(&mut cx).await? {
            if let Some(done) = hooks.on_execute_done {
                done_hooks.push(done);
            }
        }
        if short_circuit.is_some() {
            stopped_by = Some(plugin.name().to_string());
            break;
        }
    }

    if let Some(plugin) = stopped_by {
        debug!(plugin = %plugin, "execute stopped by before-hook");
        if !context_built {
            return Err(UsageError::ContextFactoryNotInvoked {
                plugin,
                phase: Phase::Execute,
            }
            .into());
        }
    }

    let result = match short_circuit {
        Some(result) => result,
        None => {
            let execute = execute_fn.ok_or(UsageError::MissingPhaseFn {
                phase: Phase::Execute,
            })?;
            execute(args).await
        }
    };

    Ok(apply_done_hooks(done_hooks, result, &context))
}

async fn dispatch_subscribe(
    plugins: Arc<[Arc<dyn Plugin>]>,
    holder: Arc<SchemaHolder>,
    mut args: ExecutionArgs,
    context_built: bool,
    pre_empted: Option<ExecutionResult>,
) -> Result<ExecutionResult, OrchestratorError> {
    let context = Arc::clone(&args.context);

    if let Some(result) = pre_empted {
        debug!("subscribe pre-empted during context building");
        return Ok(result);
    }

    let mut subscribe_fn: Option<SubscribeFn> = None;
    let mut short_circuit: Option<ExecutionResult> = None;
    let mut done_hooks: Vec<OnDone> = Vec::new();
    let mut stopped_by: Option<String> = None;

    for (index, plugin) in plugins.iter().enumerate() {
        let mut cx = SubscribeContext::new(
            &mut args,
            &mut subscribe_fn,
            &mut short_circuit,
            &holder,
            &plugins,
            index,
        );
        if let Some(hooks) = plugin.on_subscribe(&mut cx).await? {
            if let Some(done) = hooks.on_subscribe_result {
                done_hooks.push(done);
            }
        }
        if short_circuit.is_some() {
            stopped_by = Some(plugin.name().to_string());
            break;
        }
    }

    if let Some(plugin) = stopped_by {
        debug!(plugin = %plugin, "subscribe stopped by before-hook");
        if !context_built {
            return Err(UsageError::ContextFactoryNotInvoked {
                plugin,
                phase: Phase::Subscribe,
            }
            .into());
        }
    }

    let result = match short_circuit {
        Some(result) => result,
        None => {
            let subscribe = subscribe_fn.ok_or(UsageError::MissingPhaseFn {
                phase: Phase::Subscribe,
            })?;
            subscribe(args).await
        }
    };

    Ok(apply_done_hooks(done_hooks, result, &context))
}
