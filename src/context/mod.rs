//! # Request Context Module
//!
//! One [`RequestContext`] exists per in-flight request and is the single
//! piece of shared mutable state the whole dispatch runs against: the
//! capture buffer produced by routing, the current argument list, the
//! response under construction, the stash, and the [`DispatchCursor`].
//!
//! The cursor lives here rather than on any chain because chains nest: a
//! chain entry can itself be a chain, and every nesting level must observe
//! the same outstanding-detach count and the same capture cursor. All
//! cursor mutation happens on the request's own coroutine; completions
//! arriving from other coroutines are turned into [`ResumeEvent`]s on the
//! request slot's channel instead of touching the cursor directly.

mod core;
mod detach;

pub use core::{
    ArgVec, DispatchCursor, HeaderVec, RequestContext, ResponseState, MAX_INLINE_ARGS,
    MAX_INLINE_HEADERS,
};
pub use detach::{DetachHandle, ResumeEvent};
