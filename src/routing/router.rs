//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled prefix routes
//! - Look up the matching route for a path
//! - Return the upstream and rewritten path, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest prefix wins; O(n) scan is fine for a handful of routes
//! - Explicit None rather than a silent default upstream

use std::sync::Arc;

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;
use crate::upstream::{Upstream, UpstreamRegistry};

/// Result of a successful route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The configured prefix that matched.
    pub prefix: String,
    /// Upstream selected by the route.
    pub upstream: Arc<Upstream>,
    /// Path to request on the upstream; never empty.
    pub path: String,
}

#[derive(Debug)]
struct Route {
    matcher: PathPrefixMatcher,
    upstream: Arc<Upstream>,
}

/// Prefix router mapping inbound paths to upstreams.
#[derive(Debug, Default)]
pub struct PathRouter {
    routes: Vec<Route>,
}

impl PathRouter {
    /// Build a router from `(prefix, upstream)` pairs.
    pub fn new(entries: Vec<(String, Arc<Upstream>)>) -> Self {
        let mut routes: Vec<Route> = entries
            .into_iter()
            .map(|(prefix, upstream)| Route {
                matcher: PathPrefixMatcher::new(prefix),
                upstream,
            })
            .collect();
        routes.sort_by(|a, b| b.matcher.prefix().len().cmp(&a.matcher.prefix().len()));
        Self { routes }
    }

    /// Compile routes from configuration, resolving upstream keys.
    pub fn from_config(configs: &[RouteConfig], upstreams: &UpstreamRegistry) -> Self {
        let mut entries = Vec::with_capacity(configs.len());
        for cfg in configs {
            match upstreams.get(&cfg.upstream) {
                Some(upstream) => entries.push((cfg.prefix.clone(), upstream)),
                None => {
                    tracing::warn!(prefix = %cfg.prefix, upstream = %cfg.upstream, "Route references unknown upstream, skipping");
                }
            }
        }
        Self::new(entries)
    }

    /// Find the route for a request path.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            route.matcher.strip(path).map(|rest| RouteMatch {
                prefix: route.matcher.prefix().to_string(),
                upstream: route.upstream.clone(),
                path: if rest.is_empty() { "/".to_string() } else { rest.to_string() },
            })
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    fn router() -> PathRouter {
        let config = GatewayConfig::default();
        let upstreams = UpstreamRegistry::from_config(&config.upstreams);
        PathRouter::from_config(&config.routes, &upstreams)
    }

    #[test]
    fn test_rewrites_file_route() {
        let m = router().match_path("/api/files/abc123/metadata").unwrap();
        assert_eq!(m.upstream.name, "FileService");
        assert_eq!(m.path, "/abc123/metadata");
        assert_eq!(m.prefix, "/api/files");
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let m = router().match_path("/API/Files/abc123/metadata").unwrap();
        assert_eq!(m.upstream.key, "files");
        assert_eq!(m.path, "/abc123/metadata");
    }

    #[test]
    fn test_empty_suffix_becomes_root() {
        let m = router().match_path("/api/analysis").unwrap();
        assert_eq!(m.upstream.name, "AnalysisService");
        assert_eq!(m.path, "/");
    }

    #[test]
    fn test_no_match() {
        assert!(router().match_path("/reports/1").is_none());
        assert!(router().match_path("/api/filesx").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let files = Arc::new(Upstream::new("files", "FileService", "http://a"));
        let special = Arc::new(Upstream::new("special", "Special", "http://b"));
        let router = PathRouter::new(vec![
            ("/api".to_string(), files),
            ("/api/special".to_string(), special),
        ]);

        assert_eq!(router.match_path("/api/special/x").unwrap().upstream.key, "special");
        assert_eq!(router.match_path("/api/other").unwrap().upstream.key, "files");
    }

    #[test]
    fn test_unknown_upstream_skipped() {
        let upstreams = UpstreamRegistry::from_config(&GatewayConfig::default().upstreams);
        let router = PathRouter::from_config(
            &[RouteConfig { prefix: "/x".into(), upstream: "nope".into() }],
            &upstreams,
        );
        assert!(router.is_empty());
    }
}
