//! Health endpoints.
//!
//! # Data Flow
//! ```text
//! GET /health            → gateway liveness (no upstream call)
//! GET /health/{upstream} → probe.rs → upstream GET /health (health timeout)
//!                        → relayed response | 503 JSON
//! ```
//!
//! # Design Decisions
//! - Gateway liveness never depends on upstream state
//! - Probes are on-demand only; there is no background checker

pub mod probe;

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use probe::upstream_health;

/// Liveness document served by the gateway and its upstreams.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
}

/// Gateway self liveness.
pub async fn gateway_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: "gateway",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
