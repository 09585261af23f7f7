use std::fmt;
use ulid::Ulid;

/// Identity of one in-flight request.
///
/// Minted when the request context is built and echoed by every resume
/// event, so an asynchronous completion can be matched back to the request
/// it belongs to. ULIDs sort lexically by creation time, which keeps
/// interleaved log lines from concurrent requests easy to follow.
///
/// Ids are only ever generated and compared; nothing in the dispatch path
/// parses one back from text, so there is no `FromStr`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    ulid: Ulid,
}

impl RequestId {
    /// Mint a fresh id.
    #[must_use]
    pub fn new() -> Self {
        RequestId { ulid: Ulid::new() }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        RequestId::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ulid, f)
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.ulid)
    }
}
