use crate::context::RequestContext;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registration-time identity of an action.
///
/// Immutable after registration: the dispatch core and the registry hand
/// out shared references and never write back.
///
/// Names use `Arc<str>` because they come from the static registry (known
/// at startup) and are cloned onto every chain that references the action;
/// `Arc::clone()` is O(1) versus an O(n) string copy.
#[derive(Debug, Clone)]
pub struct ActionMeta {
    /// Short name, unique within the namespace (e.g. `show`)
    pub name: Arc<str>,
    /// Namespace the action lives under (e.g. `user/profile`)
    pub namespace: Arc<str>,
    /// Reverse path used for lookups and URI generation (e.g. `user/profile/show`)
    pub reverse: Arc<str>,
    /// Attribute mapping declared at registration (string to string list)
    pub attributes: HashMap<String, Vec<String>>,
    /// Name of the controller the action belongs to
    pub controller: Arc<str>,
    /// Path captures this action consumes when executed inside a chain.
    /// Zero for actions that take trailing arguments instead of captures.
    pub number_of_captures: usize,
}

impl ActionMeta {
    /// Create a new meta with `reverse` defaulted to `namespace/name`.
    pub fn new(name: &str, namespace: &str) -> Self {
        let reverse = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}/{name}")
        };
        ActionMeta {
            name: Arc::from(name),
            namespace: Arc::from(namespace),
            reverse: Arc::from(reverse.as_str()),
            attributes: HashMap::new(),
            controller: Arc::from(""),
            number_of_captures: 0,
        }
    }

    /// Set the number of path captures this action consumes.
    #[must_use]
    pub fn with_captures(mut self, n: usize) -> Self {
        self.number_of_captures = n;
        self
    }

    /// Override the reverse path.
    #[must_use]
    pub fn with_reverse(mut self, reverse: &str) -> Self {
        self.reverse = Arc::from(reverse);
        self
    }

    /// Set the owning controller name.
    #[must_use]
    pub fn with_controller(mut self, controller: &str) -> Self {
        self.controller = Arc::from(controller);
        self
    }

    /// Add an attribute entry.
    #[must_use]
    pub fn with_attribute(mut self, key: &str, values: &[&str]) -> Self {
        self.attributes
            .insert(key.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }
}

/// One unit of route-matched request-handling logic.
///
/// `dispatch` receives the shared per-request context: the argument list
/// for this invocation has already been placed on it by the caller (a chain
/// distributing captures, or the engine for a bare action). A `false`
/// return aborts the enclosing chain immediately; starting asynchronous
/// work goes through [`RequestContext::detach`] and does not change the
/// return value.
pub trait Action: Send + Sync {
    /// Registration-time identity.
    fn meta(&self) -> &ActionMeta;

    /// Short name from the meta.
    fn name(&self) -> &str {
        &self.meta().name
    }

    /// Captures consumed when executed inside a chain.
    fn number_of_captures(&self) -> usize {
        self.meta().number_of_captures
    }

    /// Run the action against the request. Returns `false` on failure.
    fn dispatch(&self, ctx: &mut RequestContext) -> bool;
}

/// Handler closure backing a [`LeafAction`].
pub type ActionHandler = Box<dyn Fn(&mut RequestContext) -> bool + Send + Sync>;

/// An action backed by a handler closure.
pub struct LeafAction {
    meta: ActionMeta,
    handler: ActionHandler,
}

impl LeafAction {
    /// Wrap a handler closure with its registration identity.
    pub fn new<F>(meta: ActionMeta, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) -> bool + Send + Sync + 'static,
    {
        LeafAction {
            meta,
            handler: Box::new(handler),
        }
    }

    /// Convenience constructor returning the action ready for a registry.
    pub fn shared<F>(meta: ActionMeta, handler: F) -> Arc<dyn Action>
    where
        F: Fn(&mut RequestContext) -> bool + Send + Sync + 'static,
    {
        Arc::new(Self::new(meta, handler))
    }
}

impl Action for LeafAction {
    fn meta(&self) -> &ActionMeta {
        &self.meta
    }

    fn dispatch(&self, ctx: &mut RequestContext) -> bool {
        debug!(
            request_id = %ctx.request_id,
            action = %self.meta.reverse,
            args = ?ctx.args(),
            "Action dispatch"
        );
        (self.handler)(ctx)
    }
}

impl std::fmt::Debug for LeafAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafAction")
            .field("reverse", &self.meta.reverse)
            .field("captures", &self.meta.number_of_captures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_defaults_reverse_from_namespace_and_name() {
        let meta = ActionMeta::new("show", "user/profile");
        assert_eq!(meta.reverse.as_ref(), "user/profile/show");
        assert_eq!(meta.number_of_captures, 0);
    }

    #[test]
    fn meta_root_namespace_reverse_is_bare_name() {
        let meta = ActionMeta::new("index", "");
        assert_eq!(meta.reverse.as_ref(), "index");
    }

    #[test]
    fn builder_fields_stick() {
        let meta = ActionMeta::new("show", "user")
            .with_captures(2)
            .with_controller("User")
            .with_attribute("Chained", &["/"]);
        assert_eq!(meta.number_of_captures, 2);
        assert_eq!(meta.controller.as_ref(), "User");
        assert_eq!(meta.attributes["Chained"], vec!["/".to_string()]);
    }
}
