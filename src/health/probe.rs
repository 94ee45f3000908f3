//! Upstream health probing.
//!
//! # Responsibilities
//! - Resolve the named upstream
//! - Issue one GET to its `/health` with the short health timeout
//! - Relay the answer, or report the upstream unavailable

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request},
    response::Response,
};
use serde_json::json;

use crate::http::error::GatewayError;
use crate::http::request::{correlation_headers, RequestIdExt};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;

const HEALTH_PATH: &str = "/health";

/// Proxy `GET /health` on the named upstream.
pub async fn upstream_health(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let upstream = state.upstreams.get(&key).ok_or_else(|| GatewayError::Validation {
        error: "Unknown upstream".to_string(),
        message: format!("No upstream named '{}' is configured", key),
        details: Some(json!({ "upstream": key })),
    })?;

    let mut builder = Request::builder()
        .method("GET")
        .uri(upstream.target(HEALTH_PATH, None))
        .header("user-agent", "submission-gateway-health-check");
    if let Some(h) = builder.headers_mut() {
        h.extend(correlation_headers(&headers));
    }
    let request = builder
        .body(Body::empty())
        .map_err(|e| GatewayError::Internal(format!("failed to build health check request: {}", e)))?;

    let timeout = state.dispatcher.health_timeout();
    match state.dispatcher.dispatch_with_timeout(request, timeout).await {
        Ok(upstream_response) => {
            let healthy = upstream_response.status.is_success();
            if !healthy {
                tracing::warn!(upstream = %upstream.name, status = %upstream_response.status, "Health check failed: non-success status");
            }
            metrics::record_upstream_health(&upstream.name, healthy);
            Ok(response::relay(upstream_response))
        }
        Err(e) => {
            tracing::warn!(
                request_id = %headers.request_id(),
                upstream = %upstream.name,
                kind = e.kind(),
                error = ?e,
                "Health check failed"
            );
            metrics::record_upstream_health(&upstream.name, false);
            Err(GatewayError::Unavailable {
                upstream: upstream.name.clone(),
                message: e.to_string(),
            })
        }
    }
}
