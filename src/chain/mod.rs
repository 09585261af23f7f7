//! # Action Chain Module
//!
//! An [`ActionChain`] composes an ordered list of actions into one
//! pseudo-action. Execution walks the links in order, handing each
//! intermediate link its declared slice of the request's path captures and
//! handing the final link the chain's original argument list. When a link
//! starts asynchronous work the chain parks itself at the next iteration
//! boundary and is re-entered later at the exact link where it stopped —
//! completed links never run twice.
//!
//! Progress lives on the request's [`DispatchCursor`]
//! [`crate::context::DispatchCursor`], not on the chain: chains are
//! immutable after construction and a single chain instance serves many
//! concurrent requests.

mod core;

pub use core::{ActionChain, ChainError};
