use crate::ids::RequestId;
use may::sync::mpsc;
use tracing::{error, warn};

/// Event delivered to a request slot's resume channel.
///
/// Carries the request identity so a slot can reject events that belong to
/// a request it is no longer driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeEvent {
    /// An asynchronous operation started by this request has completed.
    Done { request_id: RequestId },
    /// An external collaborator (timeout, cancellation) is terminating the
    /// request; the slot treats this as a per-request failure.
    Abort { request_id: RequestId },
}

impl ResumeEvent {
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        match self {
            ResumeEvent::Done { request_id } | ResumeEvent::Abort { request_id } => *request_id,
        }
    }
}

/// Completion token for one asynchronous detachment.
///
/// [`RequestContext::detach`](crate::context::RequestContext::detach)
/// increments the outstanding-detach count and hands this out; the count
/// comes back down exactly once per handle, when the completion event it
/// sends is received by the request slot. The token is consumed by
/// [`complete`](DetachHandle::complete); dropping it without completing
/// sends the event anyway, so an abandoned handle cannot strand the
/// request in a permanently suspended state.
#[derive(Debug)]
pub struct DetachHandle {
    request_id: RequestId,
    tx: mpsc::Sender<ResumeEvent>,
    completed: bool,
}

impl DetachHandle {
    pub(crate) fn new(request_id: RequestId, tx: mpsc::Sender<ResumeEvent>) -> Self {
        DetachHandle {
            request_id,
            tx,
            completed: false,
        }
    }

    /// The request this detachment belongs to.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Signal that the asynchronous operation has finished.
    pub fn complete(mut self) {
        self.finish();
    }

    /// Terminate the request instead of completing the operation.
    ///
    /// The timeout/cancellation path for an operation that will never
    /// finish: sends an abort event in place of the completion, and the
    /// slot fails the request. The outstanding-detach count is never
    /// decremented; the request is gone before it matters.
    pub fn abort(mut self) {
        self.completed = true;
        let event = ResumeEvent::Abort {
            request_id: self.request_id,
        };
        warn!(request_id = %self.request_id, "Detached operation aborted");
        if self.tx.send(event).is_err() {
            error!(
                request_id = %self.request_id,
                "Abort arrived after the request was discarded"
            );
        }
    }

    fn finish(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let event = ResumeEvent::Done {
            request_id: self.request_id,
        };
        if self.tx.send(event).is_err() {
            // The request context was discarded before the operation
            // finished; fatal for this request only.
            error!(
                request_id = %self.request_id,
                "Async completion arrived after the request was discarded"
            );
        }
    }
}

impl Drop for DetachHandle {
    fn drop(&mut self) {
        if !self.completed {
            warn!(
                request_id = %self.request_id,
                "Detach handle dropped without complete(); completing implicitly"
            );
            self.finish();
        }
    }
}
