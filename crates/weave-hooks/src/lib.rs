//! # weave-hooks
//!
//! The plugin contract for the weave hook orchestration engine.
//!
//! A [`Plugin`](plugin::Plugin) contributes optional before-hooks to the five
//! pipeline phases (parse, validate, context building, execute, subscribe).
//! A before-hook receives a phase context carrying capabilities — replace the
//! phase function, extend the shared context, short-circuit the phase — and
//! may return an after-callback that observes the phase result.
//!
//! ## Execution Model
//!
//! Before-hooks run in flattened plugin-list order, each awaited before the
//! next starts. After-callbacks run in exact reverse order, closing the onion
//! the same way the [`instrumentation`] composer unwinds: the first plugin's
//! after-logic runs last.
//!
//! ## Dynamic registration
//!
//! During [`on_init`](plugin::Plugin::on_init) a plugin may
//! [`add_plugin`](init::InitContext::add_plugin) further plugins. Added
//! plugins are spliced immediately after the inserting plugin and initialized
//! depth-first, so the flattened order is fully resolved — and frozen —
//! before the first request is dispatched.
//!
//! ## Fail-Fast
//!
//! An `on_init` error aborts orchestrator construction. Hook errors at
//! request time abort the current phase and propagate to the caller; nothing
//! is retried or recovered silently.

#![deny(unsafe_code)]

pub mod contexts;
pub mod entry;
pub mod errors;
pub mod init;
pub mod instrumentation;
pub mod plugin;
pub mod schema_state;
