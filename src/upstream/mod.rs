//! Upstream services subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamConfig[]
//!     → UpstreamRegistry (key → Arc<Upstream>, built once at startup)
//!     → referenced by routes, health probes, composite operation
//!
//! OutboundRequest
//!     → dispatcher.rs (single attempt, bounded timeout)
//!     → UpstreamResponse (fully buffered) | DispatchError
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream per logical service; no replica balancing
//! - Registry is immutable after construction (shared without locks)
//! - Keys are matched case-insensitively

pub mod dispatcher;

use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::config::UpstreamConfig;

pub use dispatcher::{DispatchError, UpstreamDispatcher, UpstreamResponse};

/// A single backend service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Short key (e.g., "files").
    pub key: String,
    /// Logical name used in error responses (e.g., "FileService").
    pub name: String,
    /// Base URL without trailing slash.
    pub base_url: String,
}

impl Upstream {
    /// Create a new upstream, normalizing the base URL.
    pub fn new(key: impl Into<String>, name: impl Into<String>, base_url: &str) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the absolute target URL for a path and optional raw query.
    pub fn target(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(q) => format!("{}{}?{}", self.base_url, path, q),
            None => format!("{}{}", self.base_url, path),
        }
    }
}

/// Lookup table of configured upstreams.
#[derive(Debug, Default)]
pub struct UpstreamRegistry {
    by_key: HashMap<String, Arc<Upstream>>,
}

impl UpstreamRegistry {
    /// Build the registry from configuration.
    ///
    /// Entries whose base URL does not parse are skipped with a warning;
    /// validation rejects them before this point in normal startup.
    pub fn from_config(configs: &[UpstreamConfig]) -> Self {
        let mut by_key = HashMap::new();
        for cfg in configs {
            if let Err(e) = Url::parse(&cfg.base_url) {
                tracing::warn!(key = %cfg.key, base_url = %cfg.base_url, error = %e, "Skipping upstream with invalid base URL");
                continue;
            }
            let upstream = Upstream::new(cfg.key.clone(), cfg.name.clone(), &cfg.base_url);
            tracing::debug!(key = %upstream.key, name = %upstream.name, base_url = %upstream.base_url, "Registered upstream");
            by_key.insert(cfg.key.to_ascii_lowercase(), Arc::new(upstream));
        }
        Self { by_key }
    }

    /// Look up an upstream by key, case-insensitively.
    pub fn get(&self, key: &str) -> Option<Arc<Upstream>> {
        self.by_key.get(&key.to_ascii_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
