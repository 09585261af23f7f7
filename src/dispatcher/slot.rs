use super::core::{begin_dispatch, on_async_complete, DispatchOutcome};
use crate::chain::ActionChain;
use crate::context::{ArgVec, RequestContext, ResumeEvent};
use http::Method;
use may::sync::mpsc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Dispatch counters shared by all request slots of one service.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Requests entered into the dispatch core
    pub dispatched: AtomicU64,
    /// Requests that suspended at least once
    pub suspended: AtomicU64,
    /// Completion events that re-entered a parked chain
    pub resumed: AtomicU64,
    /// Requests that completed successfully
    pub completed: AtomicU64,
    /// Requests that failed (link failure or abort)
    pub failed: AtomicU64,
}

/// Point-in-time copy of [`DispatchMetrics`], serializable for reporting.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub suspended: u64,
    pub resumed: u64,
    pub completed: u64,
    pub failed: u64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suspension(&self) {
        self.suspended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resume(&self) {
        self.resumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, success: bool) {
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            suspended: self.suspended.load(Ordering::Relaxed),
            resumed: self.resumed.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// One engine request slot: drives a single request from dispatch entry to
/// a terminal outcome, parking between suspension and resume.
///
/// The slot owns the resume-event channel. Asynchronous completions (and
/// external aborts) send [`ResumeEvent`]s through [`RequestSlot::sender`];
/// the slot receives them on the request's own coroutine, so all cursor
/// mutation stays single-threaded even though completions originate
/// elsewhere. Blocking on the channel yields the coroutine, not the OS
/// thread — a suspended request costs its stack and nothing else.
pub struct RequestSlot {
    events_tx: mpsc::Sender<ResumeEvent>,
    events_rx: mpsc::Receiver<ResumeEvent>,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl RequestSlot {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        RequestSlot {
            events_tx,
            events_rx,
            metrics: None,
        }
    }

    /// A slot that reports into shared service metrics.
    pub fn with_metrics(metrics: Arc<DispatchMetrics>) -> Self {
        let mut slot = Self::new();
        slot.metrics = Some(metrics);
        slot
    }

    /// Sender half of the resume-event channel, for external completion
    /// and abort collaborators.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<ResumeEvent> {
        self.events_tx.clone()
    }

    /// Build the request context wired to this slot's event channel.
    pub fn context(
        &self,
        method: Method,
        path: impl Into<String>,
        captures: ArgVec,
        args: ArgVec,
        base_uri: url::Url,
    ) -> RequestContext {
        RequestContext::new(method, path, captures, args, base_uri, self.events_tx.clone())
    }

    /// Drive the chain to a terminal outcome.
    ///
    /// Suspensions park this coroutine on the event channel until the
    /// outstanding asynchronous work completes or an abort arrives. Events
    /// whose request id does not match the context are stale (a previous
    /// occupant of this slot) and are dropped.
    pub fn run(&self, chain: &Arc<ActionChain>, ctx: &mut RequestContext) -> DispatchOutcome {
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatch();
        }

        let mut outcome = begin_dispatch(chain, ctx);
        if outcome == DispatchOutcome::Suspended {
            if let Some(metrics) = &self.metrics {
                metrics.record_suspension();
            }
            info!(
                request_id = %ctx.request_id,
                chain_ix = ctx.cursor.chain_ix,
                "Request suspended awaiting async completion"
            );
        }

        while outcome == DispatchOutcome::Suspended {
            let event = match self.events_rx.recv() {
                Ok(event) => event,
                Err(_) => {
                    error!(
                        request_id = %ctx.request_id,
                        "Resume channel closed while suspended"
                    );
                    outcome = DispatchOutcome::Completed { success: false };
                    break;
                }
            };

            if event.request_id() != ctx.request_id {
                warn!(
                    request_id = %ctx.request_id,
                    stale_id = %event.request_id(),
                    "Dropped resume event for a discarded request"
                );
                continue;
            }

            match event {
                ResumeEvent::Done { .. } => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_resume();
                    }
                    outcome = on_async_complete(ctx);
                }
                ResumeEvent::Abort { .. } => {
                    warn!(
                        request_id = %ctx.request_id,
                        chain_ix = ctx.cursor.chain_ix,
                        "Request aborted while suspended"
                    );
                    outcome = DispatchOutcome::Completed { success: false };
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(outcome.is_success());
        }
        outcome
    }
}

impl Default for RequestSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_counters_accumulate() {
        let metrics = DispatchMetrics::new();
        metrics.record_dispatch();
        metrics.record_dispatch();
        metrics.record_suspension();
        metrics.record_resume();
        metrics.record_outcome(true);
        metrics.record_outcome(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.dispatched, 2);
        assert_eq!(snap.suspended, 1);
        assert_eq!(snap.resumed, 1);
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.failed, 1);
    }
}
