//! Convenience aliases that map a gateway path onto a fixed upstream path.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use serde_json::json;
use std::time::Instant;
use uuid::Uuid;

use crate::http::body::BodyPayload;
use crate::http::error::{GatewayError, ProxyError};
use crate::http::request::{correlation_headers, OutboundRequest, RequestIdExt};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;

/// `GET /reports/{id}` → report listing for a work on the analysis upstream.
pub async fn reports(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let start_time = Instant::now();
    let request_id = headers.request_id();

    let work_id = Uuid::parse_str(&id).map_err(|_| GatewayError::Validation {
        error: "Invalid ID format".to_string(),
        message: "Work id must be a UUID".to_string(),
        details: Some(json!({ "workId": id })),
    })?;

    let upstream = state.upstreams.get(&state.reports.upstream).ok_or_else(|| {
        GatewayError::Internal(format!("reports upstream '{}' is not registered", state.reports.upstream))
    })?;

    let path = state
        .reports
        .path_template
        .replace("{id}", &work_id.hyphenated().to_string());
    let outbound = OutboundRequest::to(
        &upstream,
        Method::GET,
        &path,
        None,
        correlation_headers(&headers),
        BodyPayload::None,
    )?;

    tracing::debug!(request_id = %request_id, work_id = %work_id, target = %outbound.uri, "Fetching reports");

    let result = state.dispatcher.dispatch(outbound.into_request()?).await;
    let status = match &result {
        Ok(r) => r.status.as_u16(),
        Err(_) => 502,
    };
    metrics::record_request("GET", status, &upstream.name, start_time);

    let upstream_response =
        result.map_err(|e| ProxyError::from_dispatch(&upstream, &e, uri.path(), &request_id))?;
    Ok(response::relay(upstream_response))
}
