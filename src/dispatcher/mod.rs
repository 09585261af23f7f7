//! # Dispatcher Module
//!
//! The dispatch core drives one matched chain against one request on the
//! `may` coroutine runtime and owns the suspend/resume protocol:
//!
//! 1. [`begin_dispatch`] resets the request's cursor and runs the chain.
//! 2. If a link detaches asynchronously, the chain parks itself and the
//!    outcome is [`DispatchOutcome::Suspended`]. The engine must not reuse
//!    or finalize the request slot while suspended.
//! 3. The completion of the asynchronous work sends a
//!    [`ResumeEvent`](crate::context::ResumeEvent) to the request slot,
//!    which decrements the detachment count and, once it reaches zero,
//!    re-enters the front of the pending-resume queue via
//!    [`resume_dispatch`]. Completed links never run twice.
//!
//! [`RequestSlot`] packages this protocol for the engine: it owns the
//! resume-event channel and blocks (cooperatively, on the coroutine
//! scheduler) between suspension and resume, so a parked request costs one
//! coroutine stack and nothing else.
//!
//! All cursor state is per-request; the dispatch core holds no state of
//! its own and a single chain instance serves any number of concurrent
//! requests.

mod core;
mod slot;

pub use core::{begin_dispatch, on_async_complete, resume_dispatch, DispatchOutcome};
pub use slot::{DispatchMetrics, MetricsSnapshot, RequestSlot};
