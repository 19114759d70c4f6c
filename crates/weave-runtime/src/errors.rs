//! Orchestrator error types.

use thiserror::Error;

use weave_core::response::QueryError;
use weave_hooks::errors::PluginError;
use weave_hooks::instrumentation::Phase;

/// The pipeline was driven incorrectly.
///
/// Usage errors are descriptive and fatal to the current request only; they
/// name the exact misuse rather than degrading into an incomplete dispatch.
#[derive(Debug, Error)]
pub enum UsageError {
    /// A result-setting short-circuit ran before the context factory.
    #[error(
        "plugin '{plugin}' called set_result_and_stop before the context factory ran; \
         invoke build_context() before {phase}"
    )]
    ContextFactoryNotInvoked {
        /// Plugin that called the capability.
        plugin: String,
        /// Phase the capability was used in.
        phase: Phase,
    },

    /// No plugin installed a function for the phase.
    #[error("no {phase} function installed; register an engine plugin before dispatching {phase}")]
    MissingPhaseFn {
        /// Phase with the empty slot.
        phase: Phase,
    },

    /// Validation was dispatched with no schema registered.
    #[error("no schema registered; set one during initialization or via replace_schema")]
    MissingSchema,

    /// An instrumentation wrapper dropped the continuation without awaiting
    /// it, so the phase produced no result.
    #[error("instrumentation for {phase} dropped the phase continuation without awaiting it")]
    PhaseSkippedByInstrument {
        /// Phase that was skipped.
        phase: Phase,
    },
}

/// Errors surfaced by a request scope's phase methods.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A plugin hook failed; the phase was aborted.
    #[error("{0}")]
    Plugin(#[from] PluginError),

    /// The pipeline was used incorrectly.
    #[error("{0}")]
    Usage(#[from] UsageError),

    /// The parse phase produced an engine error no after-callback recovered.
    #[error("{0}")]
    Parse(#[from] QueryError),
}
