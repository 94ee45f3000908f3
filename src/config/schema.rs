//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Shared upstream client settings (pool, timeouts).
    pub client: ClientConfig,

    /// Upstream service definitions.
    pub upstreams: Vec<UpstreamConfig>,

    /// Prefix routes mapping request paths to upstreams.
    pub routes: Vec<RouteConfig>,

    /// Upload-then-analyze operation settings.
    pub composite: CompositeConfig,

    /// `/reports/{id}` alias settings.
    pub reports: ReportsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            limits: LimitsConfig::default(),
            client: ClientConfig::default(),
            upstreams: vec![
                UpstreamConfig {
                    key: "files".to_string(),
                    name: "FileService".to_string(),
                    base_url: "http://file-service:8080".to_string(),
                },
                UpstreamConfig {
                    key: "analysis".to_string(),
                    name: "AnalysisService".to_string(),
                    base_url: "http://analysis-service:8080".to_string(),
                },
            ],
            routes: vec![
                RouteConfig {
                    prefix: "/api/files".to_string(),
                    upstream: "files".to_string(),
                },
                RouteConfig {
                    prefix: "/api/analysis".to_string(),
                    upstream: "analysis".to_string(),
                },
            ],
            composite: CompositeConfig::default(),
            reports: ReportsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes. Bodies are fully buffered, so this
    /// is the only per-request memory bound.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 500 * 1024 * 1024, // 500MB
        }
    }
}

/// Upstream client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time allowed for one upstream exchange, body included.
    pub request_timeout_secs: u64,

    /// Timeout for upstream `/health` probes.
    pub health_timeout_secs: u64,

    /// Idle pooled connections kept per upstream host.
    pub pool_max_idle_per_host: usize,

    /// How long an idle pooled connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 600,
            health_timeout_secs: 5,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// A backend service the gateway forwards to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Short key used by routes and `/health/{key}`.
    pub key: String,

    /// Logical name reported in error bodies (e.g., "FileService").
    pub name: String,

    /// Base URL (e.g., "http://file-service:8080").
    pub base_url: String,
}

/// Route configuration mapping a path prefix to an upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Path prefix to match, case-insensitively (e.g., "/api/files").
    pub prefix: String,

    /// Key of the upstream to forward to.
    pub upstream: String,
}

/// Upload-then-analyze operation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Upstream key receiving the multipart upload.
    pub storage_upstream: String,

    /// Upstream key running the analysis.
    pub analysis_upstream: String,

    /// Upload path on the storage upstream.
    pub upload_path: String,

    /// Analyze path on the analysis upstream.
    pub analyze_path: String,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            storage_upstream: "files".to_string(),
            analysis_upstream: "analysis".to_string(),
            upload_path: "/upload".to_string(),
            analyze_path: "/analyze".to_string(),
        }
    }
}

/// `/reports/{id}` alias configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Upstream key serving report listings.
    pub upstream: String,

    /// Upstream path; `{id}` is replaced with the validated work id.
    pub path_template: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            upstream: "analysis".to_string(),
            path_template: "/works/{id}/reports".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
