use crate::action::{Action, ActionMeta};
use crate::context::{ArgVec, RequestContext};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Chain construction failure.
///
/// Rejected at registration time, before any request can reach the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A chain must contain at least one action.
    Empty,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Empty => write!(f, "an action chain requires at least one action"),
        }
    }
}

impl std::error::Error for ChainError {}

/// An ordered composite of actions executed as one pseudo-action.
///
/// Identity is derived from the final link: the chain's name is the final
/// action's name with a `_` prefix, and namespace, reverse path,
/// attributes, and controller are copied from it. The chain's capture
/// count is the sum over all non-final links — only intermediate links
/// destructure path segments into arguments; the final link receives
/// whatever the router left over as ordinary trailing arguments.
///
/// Links are shared references into the action registry; a link may itself
/// be a chain. Immutable after construction.
pub struct ActionChain {
    meta: ActionMeta,
    links: Vec<Arc<dyn Action>>,
    // Self-reference so a suspending execution can park this chain on the
    // request's pending-resume queue without threading Arcs through the
    // Action trait.
    this: Weak<ActionChain>,
}

impl ActionChain {
    /// Build a chain from an ordered, non-empty list of actions.
    pub fn new(links: Vec<Arc<dyn Action>>) -> Result<Arc<Self>, ChainError> {
        let last = links.last().ok_or(ChainError::Empty)?;
        let last_meta = last.meta();

        let total_captures: usize = links[..links.len() - 1]
            .iter()
            .map(|link| link.number_of_captures())
            .sum();

        let meta = ActionMeta {
            name: Arc::from(format!("_{}", last_meta.name).as_str()),
            namespace: Arc::clone(&last_meta.namespace),
            reverse: Arc::clone(&last_meta.reverse),
            attributes: last_meta.attributes.clone(),
            controller: Arc::clone(&last_meta.controller),
            number_of_captures: total_captures,
        };

        Ok(Arc::new_cyclic(|this| ActionChain {
            meta,
            links,
            this: this.clone(),
        }))
    }

    /// The ordered links of this chain.
    #[must_use]
    pub fn links(&self) -> &[Arc<dyn Action>] {
        &self.links
    }

    /// Execute links from the request's current chain index to the end.
    ///
    /// Returns `false` as soon as any link's dispatch fails; no further
    /// links run and no further captures are consumed. Returns `true` both
    /// on completion and on suspension — a suspended chain has parked
    /// itself on the request's pending-resume queue and the caller
    /// distinguishes the two through the cursor.
    pub fn do_execute(&self, ctx: &mut RequestContext) -> bool {
        // Snapshot of the argument list as the chain was entered. The
        // final link receives this, and a suspending execution restores it
        // so resumption sees the outer argument context, not an
        // intermediate link's capture slice.
        let entry_args: ArgVec = ctx.args().iter().cloned().collect();
        let last_ix = self.links.len() - 1;

        while ctx.cursor.chain_ix < self.links.len() {
            // Detachment only suspends if still outstanding when the next
            // link is about to start.
            if ctx.cursor.async_detached > 0 {
                if let Some(me) = self.this.upgrade() {
                    ctx.cursor.pending_resume.push_front(me);
                }
                debug!(
                    request_id = %ctx.request_id,
                    chain = %self.meta.name,
                    chain_ix = ctx.cursor.chain_ix,
                    async_detached = ctx.cursor.async_detached,
                    "Chain suspended"
                );
                ctx.set_args(entry_args);
                return true;
            }

            let ix = ctx.cursor.chain_ix;
            let link = &self.links[ix];

            // Slice captures for every link; the final link's slice is
            // discarded but still advances the consumed-capture cursor.
            let sliced = ctx.take_captures(link.number_of_captures());
            if ix == last_ix {
                ctx.set_args(entry_args.clone());
            } else {
                ctx.set_args(sliced);
            }

            if !link.dispatch(ctx) {
                warn!(
                    request_id = %ctx.request_id,
                    chain = %self.meta.name,
                    link = %link.meta().reverse,
                    chain_ix = ix,
                    "Chain aborted by link failure"
                );
                return false;
            }
            ctx.cursor.chain_ix += 1;
        }

        true
    }
}

impl Action for ActionChain {
    fn meta(&self) -> &ActionMeta {
        &self.meta
    }

    fn dispatch(&self, ctx: &mut RequestContext) -> bool {
        self.do_execute(ctx)
    }
}

impl fmt::Debug for ActionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionChain")
            .field("name", &self.meta.name)
            .field("links", &self.links.len())
            .field("captures", &self.meta.number_of_captures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::LeafAction;

    fn leaf(name: &str, captures: usize) -> Arc<dyn Action> {
        LeafAction::shared(
            ActionMeta::new(name, "user").with_captures(captures),
            |_| true,
        )
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert_eq!(ActionChain::new(Vec::new()).unwrap_err(), ChainError::Empty);
    }

    #[test]
    fn identity_derives_from_final_link() {
        let chain = ActionChain::new(vec![leaf("base", 1), leaf("show", 3)]).unwrap();
        assert_eq!(chain.meta().name.as_ref(), "_show");
        assert_eq!(chain.meta().namespace.as_ref(), "user");
        assert_eq!(chain.meta().reverse.as_ref(), "user/show");
    }

    #[test]
    fn capture_count_sums_non_final_links() {
        let chain = ActionChain::new(vec![leaf("a", 2), leaf("b", 1), leaf("c", 5)]).unwrap();
        // the final link's declared captures do not count
        assert_eq!(chain.number_of_captures(), 3);
    }

    #[test]
    fn single_link_chain_has_zero_captures() {
        let chain = ActionChain::new(vec![leaf("only", 4)]).unwrap();
        assert_eq!(chain.number_of_captures(), 0);
    }
}
