use crate::chain::ActionChain;
use crate::context::RequestContext;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of driving a request through the dispatch core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The chain ran to a terminal state. `success` is `false` when a
    /// link's dispatch failed and aborted the remainder of the chain.
    Completed { success: bool },
    /// An asynchronous detach is outstanding; the chain has parked itself
    /// and must be resumed by a later completion event. The request slot
    /// must stay alive.
    Suspended,
}

impl DispatchOutcome {
    /// True only for a successful completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { success: true })
    }

    fn completed(success: bool) -> Self {
        DispatchOutcome::Completed { success }
    }
}

/// Enter a chain for a fresh request.
///
/// Resets the request's dispatch cursor to zero state, then executes links
/// in order until the chain completes, a link fails, or an asynchronous
/// detach suspends it.
pub fn begin_dispatch(chain: &Arc<ActionChain>, ctx: &mut RequestContext) -> DispatchOutcome {
    ctx.cursor.reset();
    if !chain.do_execute(ctx) {
        return DispatchOutcome::completed(false);
    }
    if ctx.cursor.suspended() {
        DispatchOutcome::Suspended
    } else {
        DispatchOutcome::completed(true)
    }
}

/// Account for one completed asynchronous operation.
///
/// Decrements the outstanding-detach count; when it reaches zero the
/// pending-resume queue is drained via [`resume_dispatch`]. Called by the
/// request slot once per received completion event — the pairing with
/// [`RequestContext::detach`](crate::context::RequestContext::detach) is
/// what keeps the count balanced.
pub fn on_async_complete(ctx: &mut RequestContext) -> DispatchOutcome {
    if ctx.cursor.async_detached == 0 {
        // A completion with no matching detach would otherwise wrap the
        // counter and suspend the request forever.
        warn!(
            request_id = %ctx.request_id,
            "Unbalanced async completion ignored"
        );
    } else {
        ctx.cursor.async_detached -= 1;
    }
    debug!(
        request_id = %ctx.request_id,
        async_detached = ctx.cursor.async_detached,
        pending = ctx.cursor.pending_resume.len(),
        "Async operation completed"
    );
    if ctx.cursor.async_detached > 0 {
        return DispatchOutcome::Suspended;
    }
    resume_dispatch(ctx)
}

/// Re-enter parked chains, front of the queue first.
///
/// Each resumed chain continues at the exact chain index where it stopped.
/// A chain may suspend again mid-drain (a resumed link starts new async
/// work); the drain stops as soon as the detachment count rises. Resuming
/// a request with nothing pending is a no-op reporting successful
/// completion — earlier links are never re-run.
pub fn resume_dispatch(ctx: &mut RequestContext) -> DispatchOutcome {
    while ctx.cursor.async_detached == 0 {
        let chain = match ctx.cursor.pending_resume.pop_front() {
            Some(chain) => chain,
            None => return DispatchOutcome::completed(true),
        };
        debug!(
            request_id = %ctx.request_id,
            chain_ix = ctx.cursor.chain_ix,
            "Chain resumed"
        );
        if !chain.do_execute(ctx) {
            return DispatchOutcome::completed(false);
        }
    }
    DispatchOutcome::Suspended
}
