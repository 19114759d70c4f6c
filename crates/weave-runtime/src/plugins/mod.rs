//! Built-in plugins.
//!
//! The orchestrator core dispatches whatever plugins it is given; these are
//! the handful every deployment needs: an engine carrier installing the
//! default phase functions, a fixed-schema plugin, a tracing-based phase
//! logger, and a context extender.

mod engine;
mod extend_context;
mod logger;
mod schema;

pub use engine::{EnginePlugin, use_engine};
pub use extend_context::{ExtendContextPlugin, use_extend_context};
pub use logger::{LoggerPlugin, use_logger};
pub use schema::{SchemaPlugin, use_schema};
