//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, upstream failures)
//! - Expose a Prometheus scrape endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, upstream
//! - `gateway_request_duration_seconds` (histogram): latency by upstream
//! - `gateway_upstream_failures_total` (counter): dispatch failures by upstream, kind
//! - `gateway_upstream_health` (gauge): 1=healthy, 0=unhealthy, last probe
//! - `gateway_composite_total` (counter): upload-with-analysis outcomes
//! - `gateway_panics_total` (counter): handler panics caught
//!
//! Recording without an installed exporter is a no-op, so handlers and
//! tests never need to check whether metrics are enabled.

use metrics::{counter, gauge, histogram, Label};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, upstream: &str, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("status", status.to_string()),
        Label::new("upstream", upstream.to_string()),
    ];
    counter!("gateway_requests_total", labels).increment(1);
    histogram!("gateway_request_duration_seconds", "upstream" => upstream.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(upstream: &str, kind: &'static str) {
    counter!(
        "gateway_upstream_failures_total",
        "upstream" => upstream.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_upstream_health(upstream: &str, healthy: bool) {
    gauge!("gateway_upstream_health", "upstream" => upstream.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_composite(outcome: &'static str) {
    counter!("gateway_composite_total", "outcome" => outcome).increment(1);
}

pub fn record_panic() {
    counter!("gateway_panics_total").increment(1);
}
