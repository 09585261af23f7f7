use crate::action::Action;
use crate::chain::ActionChain;
use crate::context::ArgVec;
use http::Method;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};

/// A matched request, ready for the dispatch core: the chain to execute,
/// the captures extracted from the path in match order, and whatever path
/// segments were left over as trailing arguments.
#[derive(Debug, Clone)]
pub struct RoutedRequest {
    pub chain: Arc<ActionChain>,
    pub captures: ArgVec,
    pub args: ArgVec,
}

/// Table-based route matching.
///
/// Patterns are plain path templates: a `{name}` segment captures one path
/// segment (names are documentation only, captures are positional), and a
/// trailing `...` segment collects the remaining path segments as the
/// chain's trailing arguments. Everything else matches literally.
///
/// First registered match wins. The table is built at startup and read
/// behind a shared lock thereafter.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<(Method, Regex, Arc<ActionChain>, bool)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chain under a method and path pattern.
    pub fn add(&mut self, method: Method, pattern: &str, chain: Arc<ActionChain>) {
        let (regex, has_tail) = Self::pattern_to_regex(pattern);
        info!(
            method = %method,
            pattern = %pattern,
            chain = %chain.name(),
            total_routes = self.routes.len() + 1,
            "Route registered"
        );
        self.routes.push((method, regex, chain, has_tail));
    }

    /// Match a request path, extracting captures and trailing arguments.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RoutedRequest> {
        for (route_method, regex, chain, has_tail) in &self.routes {
            if route_method != method {
                continue;
            }
            let caps = match regex.captures(path) {
                Some(caps) => caps,
                None => continue,
            };

            let mut captures = ArgVec::new();
            let mut args = ArgVec::new();
            let group_count = caps.len() - 1;
            for i in 1..=group_count {
                let text = caps.get(i).map(|m| m.as_str()).unwrap_or("");
                if *has_tail && i == group_count {
                    args.extend(text.split('/').filter(|s| !s.is_empty()).map(String::from));
                } else {
                    captures.push(text.to_string());
                }
            }

            debug!(
                method = %method,
                path = %path,
                chain = %chain.name(),
                captures = ?captures,
                args = ?args,
                "Route matched"
            );
            return Some(RoutedRequest {
                chain: Arc::clone(chain),
                captures,
                args,
            });
        }

        debug!(method = %method, path = %path, "No route matched");
        None
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Convert a path template to a regex and a has-trailing-args flag.
    fn pattern_to_regex(pattern: &str) -> (Regex, bool) {
        let mut has_tail = false;
        let mut out = String::with_capacity(pattern.len() + 8);
        out.push('^');
        for segment in pattern.split('/') {
            if segment.is_empty() {
                continue;
            }
            if segment == "..." {
                has_tail = true;
                break;
            }
            if segment.starts_with('{') && segment.ends_with('}') {
                out.push_str("/([^/]+)");
            } else {
                out.push('/');
                out.push_str(&regex::escape(segment));
            }
        }
        if out.len() == 1 {
            out.push('/');
        }
        if has_tail {
            out.push_str("(?:/(.*))?");
        }
        out.push('$');
        let regex = Regex::new(&out).expect("Failed to compile route pattern");
        (regex, has_tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionMeta, LeafAction};

    fn chain(name: &str, captures: usize) -> Arc<ActionChain> {
        ActionChain::new(vec![
            LeafAction::shared(ActionMeta::new("base", "t").with_captures(captures), |_| true),
            LeafAction::shared(ActionMeta::new(name, "t"), |_| true),
        ])
        .unwrap()
    }

    #[test]
    fn literal_and_capture_segments() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/user/{id}/profile", chain("profile", 1));

        let routed = table.route(&Method::GET, "/user/42/profile").unwrap();
        assert_eq!(routed.captures.as_slice(), ["42"]);
        assert!(routed.args.is_empty());

        assert!(table.route(&Method::GET, "/user/42").is_none());
        assert!(table.route(&Method::POST, "/user/42/profile").is_none());
    }

    #[test]
    fn trailing_segments_become_args() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/files/{bucket}/...", chain("serve", 1));

        let routed = table.route(&Method::GET, "/files/media/a/b/c.png").unwrap();
        assert_eq!(routed.captures.as_slice(), ["media"]);
        assert_eq!(routed.args.as_slice(), ["a", "b", "c.png"]);

        // tail may be empty
        let routed = table.route(&Method::GET, "/files/media").unwrap();
        assert!(routed.args.is_empty());
    }

    #[test]
    fn root_pattern_matches_root_only() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/", chain("index", 0));
        assert!(table.route(&Method::GET, "/").is_some());
        assert!(table.route(&Method::GET, "/other").is_none());
    }

    #[test]
    fn first_registered_match_wins() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/pets/{id}", chain("by_id", 1));
        table.add(Method::GET, "/pets/special", chain("special", 0));
        let routed = table.route(&Method::GET, "/pets/special").unwrap();
        assert_eq!(routed.chain.name(), "_by_id");
    }
}
