//! # Action Module
//!
//! Actions are the units of route-matched request-handling logic. Each one
//! carries registration-time identity ([`ActionMeta`]) and a single
//! [`Action::dispatch`] entry point that mutates the shared request context
//! and reports success or failure.
//!
//! Two implementations share the contract:
//!
//! - [`LeafAction`] — wraps a handler closure; the ordinary case.
//! - [`crate::chain::ActionChain`] — an ordered composite of actions that
//!   executes as one pseudo-action, with suspend/resume support.
//!
//! Actions are owned by an [`ActionRegistry`] built once at startup and
//! shared read-only across every worker and every in-flight request. Chains
//! hold `Arc` references into the same registry-owned actions; nothing is
//! registered or mutated after the engine starts.

mod core;
mod registry;

pub use core::{Action, ActionMeta, LeafAction};
pub use registry::ActionRegistry;
