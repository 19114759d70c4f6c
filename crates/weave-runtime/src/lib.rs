//! # weave-runtime
//!
//! The weave orchestrator: plugin initialization, per-request phase
//! dispatch, and result interception.
//!
//! - **Orchestrator**: built once from an ordered plugin list; freezes the
//!   flattened plugin order, the schema slot, and the composed
//!   instrumentation
//! - **Request scope**: produced by `invoke()` once per incoming request;
//!   owns the request's context bag, phase function slots, and stop flag
//! - **Phase dispatch**: ordered before-hooks, slot read after all writes,
//!   after-callbacks in reverse order — wrapped by the composed
//!   instrumentation for that phase
//! - **Result interceptor**: normalizes single and streamed execution
//!   results under one after-hook contract, with an exactly-once
//!   end-of-stream signal
//! - **Built-in plugins**: `use_engine`, `use_schema`, `use_logger`,
//!   `use_extend_context`

#![deny(unsafe_code)]

pub mod errors;
pub mod interceptor;
pub mod orchestrator;
pub mod plugins;
pub mod scope;
