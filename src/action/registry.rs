use super::Action;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Startup-time registry of all actions, keyed by reverse path.
///
/// Built once while the engine is single-threaded, then wrapped in an
/// `Arc` and shared read-only by every worker and every in-flight request.
/// Registration after startup is not supported; there is deliberately no
/// mutable access to the map once the registry is shared.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under its reverse path.
    ///
    /// Registering the same reverse path twice replaces the earlier action;
    /// the replacement is logged because it usually means two controllers
    /// claimed the same path.
    pub fn register(&mut self, action: Arc<dyn Action>) -> Arc<dyn Action> {
        let reverse = action.meta().reverse.to_string();
        if self.actions.contains_key(&reverse) {
            warn!(reverse = %reverse, "Replaced existing action registration");
        }
        self.actions.insert(reverse.clone(), Arc::clone(&action));
        info!(
            reverse = %reverse,
            captures = action.number_of_captures(),
            total_actions = self.actions.len(),
            "Action registered"
        );
        action
    }

    /// Look up an action by its reverse path.
    #[must_use]
    pub fn find(&self, reverse: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(reverse).cloned()
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Reverse paths of every registered action, sorted for stable output.
    #[must_use]
    pub fn reverse_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.actions.keys().cloned().collect();
        paths.sort();
        paths
    }
}
