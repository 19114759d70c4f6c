//! Instrumentation composer.
//!
//! An instrumentation entry wraps a phase call with pre/post logic. Composing
//! a list of entries nests them so the first entry is outermost: its
//! pre-logic runs first and its post-logic runs last, matching the reverse
//! order after-callbacks use.
//!
//! A wrapper receives the continuation as a lazy [`PhaseFuture`]. Awaiting it
//! runs everything nested inside (inner wrappers, then the phase dispatch
//! itself); dropping it without awaiting short-circuits the phase. Errors
//! returned by a wrapper propagate outward and nothing nested inside it runs.
//!
//! Composing an empty list yields the empty map; the dispatcher bypasses
//! wrapping entirely in that case, so an uninstrumented phase pays no extra
//! allocation or async hop.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use weave_core::context::SharedContext;

use crate::errors::PluginError;

/// One of the five pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Source text to document.
    Parse,
    /// Document against schema.
    Validate,
    /// Per-request context construction.
    ContextBuilding,
    /// Single-shot execution.
    Execute,
    /// Streamed execution.
    Subscribe,
}

impl Phase {
    /// All phases, in pipeline order.
    pub const ALL: [Phase; 5] = [
        Phase::Parse,
        Phase::Validate,
        Phase::ContextBuilding,
        Phase::Execute,
        Phase::Subscribe,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Validate => write!(f, "validate"),
            Self::ContextBuilding => write!(f, "context building"),
            Self::Execute => write!(f, "execute"),
            Self::Subscribe => write!(f, "subscribe"),
        }
    }
}

/// Payload handed to an instrumentation wrapper.
#[derive(Clone, Debug)]
pub struct InstrumentScope {
    /// Phase being wrapped.
    pub phase: Phase,
    /// The request's shared context bag.
    pub context: SharedContext,
}

/// The wrapped continuation: inner wrappers plus the phase dispatch.
///
/// Owned and `'static` — the dispatcher hands the wrapper a self-contained
/// future, so wrappers are plain closures with no lifetime gymnastics.
pub type PhaseFuture = BoxFuture<'static, Result<(), PluginError>>;

/// A phase wrapper. Await the continuation exactly once, or drop it to
/// intentionally short-circuit the phase.
pub type InstrumentFn = Arc<dyn Fn(InstrumentScope, PhaseFuture) -> PhaseFuture + Send + Sync>;

/// Build an [`InstrumentFn`] from a closure.
pub fn instrument<F>(f: F) -> InstrumentFn
where
    F: Fn(InstrumentScope, PhaseFuture) -> PhaseFuture + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Per-phase instrumentation wrappers contributed by one plugin, or the
/// merged result of composing several plugins' entries.
#[derive(Clone, Default)]
pub struct Instrumentation {
    parse: Option<InstrumentFn>,
    validate: Option<InstrumentFn>,
    context_building: Option<InstrumentFn>,
    execute: Option<InstrumentFn>,
    subscribe: Option<InstrumentFn>,
}

impl Instrumentation {
    /// Create an empty entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a wrapper for one phase, replacing any existing one.
    #[must_use]
    pub fn on(mut self, phase: Phase, wrapper: InstrumentFn) -> Self {
        *self.slot_mut(phase) = Some(wrapper);
        self
    }

    /// Wrapper for a phase, if one is attached.
    #[must_use]
    pub fn for_phase(&self, phase: Phase) -> Option<&InstrumentFn> {
        match phase {
            Phase::Parse => self.parse.as_ref(),
            Phase::Validate => self.validate.as_ref(),
            Phase::ContextBuilding => self.context_building.as_ref(),
            Phase::Execute => self.execute.as_ref(),
            Phase::Subscribe => self.subscribe.as_ref(),
        }
    }

    /// Whether no phase has a wrapper.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Phase::ALL.iter().all(|phase| self.for_phase(*phase).is_none())
    }

    /// Merge a list of entries into one, phase by phase.
    ///
    /// The first listed entry ends up outermost: for entries `[1, 2, .., n]`
    /// the merged wrapper runs `1`'s pre-logic, then `2`'s, .., then `n`'s,
    /// then the phase, then unwinds `n`, .., `2`, `1`.
    #[must_use]
    pub fn compose(entries: impl IntoIterator<Item = Instrumentation>) -> Self {
        let mut merged = Self::default();
        for entry in entries {
            merged.parse = nest(merged.parse, entry.parse);
            merged.validate = nest(merged.validate, entry.validate);
            merged.context_building = nest(merged.context_building, entry.context_building);
            merged.execute = nest(merged.execute, entry.execute);
            merged.subscribe = nest(merged.subscribe, entry.subscribe);
        }
        merged
    }

    fn slot_mut(&mut self, phase: Phase) -> &mut Option<InstrumentFn> {
        match phase {
            Phase::Parse => &mut self.parse,
            Phase::Validate => &mut self.validate,
            Phase::ContextBuilding => &mut self.context_building,
            Phase::Execute => &mut self.execute,
            Phase::Subscribe => &mut self.subscribe,
        }
    }
}

impl fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phases: Vec<Phase> = Phase::ALL
            .into_iter()
            .filter(|phase| self.for_phase(*phase).is_some())
            .collect();
        f.debug_struct("Instrumentation")
            .field("phases", &phases)
            .finish()
    }
}

/// Nest `inner` inside `outer`. The outer wrapper's pre-logic runs first and
/// its post-logic runs last.
fn nest(outer: Option<InstrumentFn>, inner: Option<InstrumentFn>) -> Option<InstrumentFn> {
    match (outer, inner) {
        (None, inner) => inner,
        (outer, None) => outer,
        (Some(outer), Some(inner)) => Some(Arc::new(move |scope, next| {
            // Building the inner future runs nothing yet; the outer wrapper
            // decides when (and whether) it is awaited.
            let wrapped = inner(scope.clone(), next);
            outer(scope, wrapped)
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;
    use weave_core::context::ContextBag;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn scope() -> InstrumentScope {
        InstrumentScope {
            phase: Phase::Execute,
            context: Arc::new(ContextBag::new()),
        }
    }

    fn tracing_wrapper(label: usize, trace: Trace, delay: Option<Duration>) -> InstrumentFn {
        instrument(move |_scope, next| {
            let trace = Arc::clone(&trace);
            Box::pin(async move {
                trace.lock().push(format!("{label}:pre"));
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                let out = next.await;
                trace.lock().push(format!("{label}:post"));
                out
            })
        })
    }

    fn entry_for(phase: Phase, wrapper: InstrumentFn) -> Instrumentation {
        Instrumentation::new().on(phase, wrapper)
    }

    async fn run(merged: &Instrumentation, phase: Phase, trace: &Trace) -> Result<(), PluginError> {
        let wrapper = merged.for_phase(phase).expect("wrapper present");
        let trace = Arc::clone(trace);
        let terminal: PhaseFuture = Box::pin(async move {
            trace.lock().push("call".to_string());
            Ok(())
        });
        wrapper(scope(), terminal).await
    }

    #[test]
    fn test_compose_empty_is_empty() {
        let merged = Instrumentation::compose(Vec::new());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_compose_keeps_unrelated_phases() {
        let trace: Trace = Arc::default();
        let merged = Instrumentation::compose(vec![entry_for(
            Phase::Parse,
            tracing_wrapper(1, Arc::clone(&trace), None),
        )]);
        assert!(merged.for_phase(Phase::Parse).is_some());
        assert!(merged.for_phase(Phase::Execute).is_none());
    }

    #[tokio::test]
    async fn test_single_wrapper_runs_around_call() {
        let trace: Trace = Arc::default();
        let merged = Instrumentation::compose(vec![entry_for(
            Phase::Execute,
            tracing_wrapper(1, Arc::clone(&trace), None),
        )]);

        run(&merged, Phase::Execute, &trace).await.unwrap();
        assert_eq!(*trace.lock(), vec!["1:pre", "call", "1:post"]);
    }

    #[tokio::test]
    async fn test_onion_order_sync() {
        let trace: Trace = Arc::default();
        let entries: Vec<Instrumentation> = (1..=3)
            .map(|n| entry_for(Phase::Execute, tracing_wrapper(n, Arc::clone(&trace), None)))
            .collect();
        let merged = Instrumentation::compose(entries);

        run(&merged, Phase::Execute, &trace).await.unwrap();
        assert_eq!(
            *trace.lock(),
            vec!["1:pre", "2:pre", "3:pre", "call", "3:post", "2:post", "1:post"]
        );
    }

    #[tokio::test]
    async fn test_onion_order_async_delays() {
        let trace: Trace = Arc::default();
        let entries: Vec<Instrumentation> = (1..=4)
            .map(|n| {
                entry_for(
                    Phase::Subscribe,
                    tracing_wrapper(n, Arc::clone(&trace), Some(Duration::from_millis(2))),
                )
            })
            .collect();
        let merged = Instrumentation::compose(entries);

        run(&merged, Phase::Subscribe, &trace).await.unwrap();
        assert_eq!(
            *trace.lock(),
            vec![
                "1:pre", "2:pre", "3:pre", "4:pre", "call", "4:post", "3:post", "2:post", "1:post"
            ]
        );
    }

    #[tokio::test]
    async fn test_wrapper_error_skips_nested_wrappers() {
        let trace: Trace = Arc::default();
        let failing: InstrumentFn = {
            let trace = Arc::clone(&trace);
            instrument(move |_scope, next| {
                let trace = Arc::clone(&trace);
                Box::pin(async move {
                    trace.lock().push("2:pre".to_string());
                    // Intentionally drop the continuation and fail.
                    drop(next);
                    Err(PluginError::Internal("wrapper failed".to_string()))
                })
            })
        };
        let entries = vec![
            entry_for(Phase::Execute, tracing_wrapper(1, Arc::clone(&trace), None)),
            entry_for(Phase::Execute, failing),
            entry_for(Phase::Execute, tracing_wrapper(3, Arc::clone(&trace), None)),
        ];
        let merged = Instrumentation::compose(entries);

        let result = run(&merged, Phase::Execute, &trace).await;
        assert!(result.is_err());
        let recorded = trace.lock().clone();
        assert_eq!(recorded, vec!["1:pre", "2:pre", "1:post"]);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Parse.to_string(), "parse");
        assert_eq!(Phase::ContextBuilding.to_string(), "context building");
        assert_eq!(Phase::Subscribe.to_string(), "subscribe");
    }

    #[test]
    fn test_debug_lists_attached_phases() {
        let trace: Trace = Arc::default();
        let entry = entry_for(Phase::Validate, tracing_wrapper(1, trace, None));
        let debug = format!("{entry:?}");
        assert!(debug.contains("Validate"));
    }
}
