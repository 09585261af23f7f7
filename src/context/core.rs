use super::detach::{DetachHandle, ResumeEvent};
use crate::chain::ActionChain;
use crate::ids::RequestId;
use http::Method;
use may::sync::mpsc;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Maximum inline captures/arguments before heap allocation.
/// Chained routes rarely destructure more than a handful of path segments.
pub const MAX_INLINE_ARGS: usize = 8;

/// Maximum inline response headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated capture/argument storage for the dispatch hot path.
pub type ArgVec = SmallVec<[String; MAX_INLINE_ARGS]>;

/// Stack-allocated response header storage.
///
/// Header names use `Arc<str>` because they are often repeated
/// (Content-Type, Location, ...) and `Arc::clone()` is O(1); values remain
/// `String` as they are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Per-request dispatch progress state.
///
/// Created with the request, reset to zero state when a top-level dispatch
/// enters, mutated only while that request is being processed, and
/// discarded with the request. Shared by every nesting level of chain
/// execution; see the module docs for why it is not per-chain state.
#[derive(Default)]
pub struct DispatchCursor {
    /// Next chain link to execute, 0-based. Monotonically non-decreasing
    /// within one traversal.
    pub chain_ix: usize,
    /// Captures already consumed from the request's capture buffer.
    pub captured: usize,
    /// Outstanding asynchronous operations. While above zero the chain
    /// must suspend at its next iteration boundary.
    pub async_detached: usize,
    /// Chains awaiting re-entry once the detachment count returns to zero.
    /// Suspending chains push themselves onto the front; resumption pops
    /// from the front.
    pub pending_resume: VecDeque<Arc<ActionChain>>,
}

impl DispatchCursor {
    /// Reset to zero state. Called at top-level dispatch entry only; a
    /// nested chain entered mid-traversal continues the shared cursor.
    pub fn reset(&mut self) {
        self.chain_ix = 0;
        self.captured = 0;
        self.async_detached = 0;
        self.pending_resume.clear();
    }

    /// True while the request has outstanding detachments or parked chains.
    #[must_use]
    pub fn suspended(&self) -> bool {
        self.async_detached > 0 || !self.pending_resume.is_empty()
    }
}

impl std::fmt::Debug for DispatchCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCursor")
            .field("chain_ix", &self.chain_ix)
            .field("captured", &self.captured)
            .field("async_detached", &self.async_detached)
            .field("pending_resume", &self.pending_resume.len())
            .finish()
    }
}

/// Response under construction on the shared context.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseState {
    /// HTTP status code (200, 404, 500, ...)
    pub status: u16,
    /// Response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl ResponseState {
    /// Set a JSON body with the matching content type.
    pub fn json(&mut self, status: u16, body: Value) {
        self.status = status;
        self.set_header("content-type", "application/json".to_string());
        self.body = body;
    }

    /// Add or update a header, case-insensitive on the name.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl Default for ResponseState {
    fn default() -> Self {
        ResponseState {
            status: 200,
            headers: HeaderVec::new(),
            body: Value::Null,
        }
    }
}

/// Shared per-request state: request identity, capture buffer, argument
/// list, response, stash, and dispatch cursor.
///
/// The capture buffer is read-only once attached; it is consumed through
/// the cursor's `captured` index, never mutated. The argument list is the
/// one mutable input slot: chains overwrite it per link with either a
/// capture slice or the chain-entry snapshot before dispatching.
pub struct RequestContext {
    /// Unique request ID for correlation across suspend/resume
    pub request_id: RequestId,
    /// HTTP method of the request
    pub method: Method,
    /// Request path as matched by routing
    pub path: String,
    /// Public base URL used for URI generation
    pub base_uri: url::Url,
    /// Dispatch progress; mutated only by the dispatch core and by
    /// [`RequestContext::detach`]
    pub cursor: DispatchCursor,
    /// Response under construction
    pub response: ResponseState,
    /// Per-request key/value scratch space used by chain links to pass
    /// derived data to later links
    pub stash: HashMap<String, Value>,
    captures: ArgVec,
    args: ArgVec,
    events_tx: mpsc::Sender<ResumeEvent>,
}

impl RequestContext {
    /// Build a context for one incoming request.
    ///
    /// `events_tx` is the request slot's resume-event channel; detach
    /// handles created from this context complete through it.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        captures: ArgVec,
        args: ArgVec,
        base_uri: url::Url,
        events_tx: mpsc::Sender<ResumeEvent>,
    ) -> Self {
        RequestContext {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            base_uri,
            cursor: DispatchCursor::default(),
            response: ResponseState::default(),
            stash: HashMap::new(),
            captures,
            args,
            events_tx,
        }
    }

    /// The capture buffer produced by routing.
    #[must_use]
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    /// The argument list for the action currently being dispatched.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Replace the argument list. Chains call this once per link.
    pub fn set_args(&mut self, args: ArgVec) {
        self.args = args;
    }

    /// Pull up to `wanted` captures from the buffer, advancing the
    /// consumed-capture cursor by however many were actually available.
    /// Short reads are not an error; the caller simply gets fewer entries.
    pub fn take_captures(&mut self, wanted: usize) -> ArgVec {
        let mut out = ArgVec::new();
        while out.len() < wanted {
            match self.captures.get(self.cursor.captured) {
                Some(c) => {
                    out.push(c.clone());
                    self.cursor.captured += 1;
                }
                None => break,
            }
        }
        out
    }

    /// Declare that asynchronous work has started.
    ///
    /// Increments the outstanding-detach count immediately; the returned
    /// handle decrements it exactly once, either through
    /// [`DetachHandle::complete`] or implicitly on drop. The chain will
    /// suspend at its next iteration boundary while the count is above
    /// zero.
    pub fn detach(&mut self) -> DetachHandle {
        self.cursor.async_detached += 1;
        debug!(
            request_id = %self.request_id,
            async_detached = self.cursor.async_detached,
            "Async detach started"
        );
        DetachHandle::new(self.request_id, self.events_tx.clone())
    }

    /// Build a fully-encoded URI from a path, positional arguments, and
    /// query pairs, rooted at the request's public base URL.
    #[must_use]
    pub fn uri_for(&self, path: &str, args: &[String], query: &[(String, String)]) -> url::Url {
        crate::templating::uri_for(&self.base_uri, path, args, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn test_ctx(captures: ArgVec) -> RequestContext {
        let (tx, _rx) = mpsc::channel();
        RequestContext::new(
            Method::GET,
            "/x",
            captures,
            ArgVec::new(),
            url::Url::parse("http://localhost:8080/").unwrap(),
            tx,
        )
    }

    #[test]
    fn take_captures_advances_cursor() {
        let mut ctx = test_ctx(smallvec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(ctx.take_captures(2).as_slice(), ["a", "b"]);
        assert_eq!(ctx.cursor.captured, 2);
        assert_eq!(ctx.take_captures(2).as_slice(), ["c"]);
        assert_eq!(ctx.cursor.captured, 3);
    }

    #[test]
    fn take_captures_tolerates_empty_buffer() {
        let mut ctx = test_ctx(ArgVec::new());
        assert!(ctx.take_captures(3).is_empty());
        assert_eq!(ctx.cursor.captured, 0);
    }

    #[test]
    fn detach_increments_count() {
        let mut ctx = test_ctx(ArgVec::new());
        let handle = ctx.detach();
        assert_eq!(ctx.cursor.async_detached, 1);
        assert!(ctx.cursor.suspended());
        handle.complete();
        // the count is decremented by the slot when the event is received,
        // not by the handle itself
        assert_eq!(ctx.cursor.async_detached, 1);
    }

    #[test]
    fn response_header_replacement_is_case_insensitive() {
        let mut resp = ResponseState::default();
        resp.set_header("Content-Type", "text/plain".to_string());
        resp.set_header("content-type", "application/json".to_string());
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.get_header("CONTENT-TYPE"), Some("application/json"));
    }
}
