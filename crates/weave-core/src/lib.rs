//! # weave-core
//!
//! Foundation types for the weave hook orchestration engine.
//!
//! This crate provides the shared vocabulary that the hook contract and the
//! orchestrator build on:
//!
//! - **Schema**: opaque, identity-compared handle to whatever schema type the
//!   underlying query engine uses
//! - **Context**: per-request key/value bag with stable object identity
//! - **Requests**: `QueryRequest` input and `Document` parse output
//! - **Responses**: `Response` payloads and `QueryError` error values
//! - **Results**: `ExecutionResult` sum type over single responses and
//!   response streams
//! - **Engine boundary**: the `QueryEngine` trait and the per-phase
//!   replaceable function aliases

#![deny(unsafe_code)]

pub mod context;
pub mod engine;
pub mod request;
pub mod response;
pub mod result;
pub mod schema;
