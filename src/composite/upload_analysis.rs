//! Upload-then-analyze operation.
//!
//! # Responsibilities
//! - Relay a multipart upload, bytes untouched, to the storage upstream
//! - Extract the assigned file id from the storage answer
//! - Ask the analysis upstream to analyze that file
//! - Merge both answers into one response
//!
//! # Design Decisions
//! - A stored upload is never rolled back. When analysis fails the caller
//!   gets 502 plus the file id, so analysis can be requested again later
//! - Storage non-2xx answers are relayed unchanged
//! - Each upstream call is made once
//! - Both upstream calls carry only the request ID and the body's own
//!   content type, never the client's headers

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;

use crate::http::body::{self, BodyKind, BodyPayload};
use crate::http::error::{GatewayError, ProxyError};
use crate::http::request::{correlation_headers, OutboundRequest, RequestIdExt};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Gateway path of the operation.
pub const UPLOAD_WITH_ANALYSIS_PATH: &str = "/api/files/upload-with-analysis";

/// What the storage upstream reports after storing a file.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub file_id: Value,
    pub file_identifier: Value,
    pub upload_date: Value,
}

/// Analysis result fields merged into the response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub report_id: Value,
    pub is_plagiarized: bool,
    pub similarity_percentage: f64,
    #[serde(default)]
    pub analysis_date: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Completed,
    Unavailable,
}

/// Merged response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub file_id: Value,
    pub file_identifier: Value,
    pub upload_date: Value,
    pub analysis_status: AnalysisStatus,
    #[serde(flatten)]
    pub analysis: Option<AnalysisReport>,
}

impl CompositeOutcome {
    pub fn completed(receipt: UploadReceipt, report: AnalysisReport) -> Self {
        Self {
            error: None,
            message: None,
            path: None,
            file_id: receipt.file_id,
            file_identifier: receipt.file_identifier,
            upload_date: receipt.upload_date,
            analysis_status: AnalysisStatus::Completed,
            analysis: Some(report),
        }
    }

    /// The upload stands; only the analysis part is missing.
    pub fn analysis_unavailable(receipt: UploadReceipt, failure: ProxyError) -> Self {
        Self {
            error: Some(failure.error),
            message: Some(failure.message),
            path: Some(failure.path),
            file_id: receipt.file_id,
            file_identifier: receipt.file_identifier,
            upload_date: receipt.upload_date,
            analysis_status: AnalysisStatus::Unavailable,
            analysis: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.analysis_status {
            AnalysisStatus::Completed => StatusCode::OK,
            AnalysisStatus::Unavailable => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Parse the storage answer. A usable receipt needs a non-empty `fileId`.
pub fn parse_receipt(body: &[u8]) -> Option<UploadReceipt> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let file_id = match value.get("fileId")? {
        Value::String(s) if !s.trim().is_empty() => Value::String(s.clone()),
        Value::Number(n) => Value::Number(n.clone()),
        _ => return None,
    };
    Some(UploadReceipt {
        file_id,
        file_identifier: value.get("fileIdentifier").cloned().unwrap_or(Value::Null),
        upload_date: value.get("uploadDate").cloned().unwrap_or(Value::Null),
    })
}

/// Parse the analysis answer.
pub fn parse_report(body: &[u8]) -> Option<AnalysisReport> {
    serde_json::from_slice(body).ok()
}

/// Any method other than POST on the operation's path.
pub async fn wrong_method(request: Request<Body>) -> GatewayError {
    GatewayError::validation(
        "Use POST /api/files/upload-with-analysis",
        format!("{} is not supported; upload with a multipart/form-data POST", request.method()),
    )
}

/// `POST /api/files/upload-with-analysis`.
pub async fn upload_with_analysis(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.headers().request_id();

    let response = match run(&state, request, &request_id).await {
        Ok(response) => response,
        Err(err) => {
            metrics::record_composite("failed");
            err.into_response()
        }
    };

    tracing::info!(
        request_id = %request_id,
        status = response.status().as_u16(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Upload with analysis completed"
    );
    metrics::record_request("POST", response.status().as_u16(), "composite", start_time);
    response
}

async fn run(state: &AppState, request: Request<Body>, request_id: &str) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let content_type = parts.headers.get(header::CONTENT_TYPE).cloned();
    if BodyKind::of(content_type.as_ref()) != BodyKind::Multipart {
        return Err(GatewayError::validation(
            "Multipart upload required",
            "This operation expects a multipart/form-data body",
        ));
    }

    let storage = state.upstreams.get(&state.composite.storage_upstream).ok_or_else(|| {
        GatewayError::Internal(format!("storage upstream '{}' is not registered", state.composite.storage_upstream))
    })?;
    let analysis = state.upstreams.get(&state.composite.analysis_upstream).ok_or_else(|| {
        GatewayError::Internal(format!("analysis upstream '{}' is not registered", state.composite.analysis_upstream))
    })?;

    let bytes = body::read_limited(&parts.headers, body, state.max_body_bytes).await?;
    tracing::debug!(request_id = %request_id, size = bytes.len(), "Relaying upload to storage");

    // 1. store (request ID and content type only)
    let upload = OutboundRequest::to(
        &storage,
        Method::POST,
        &state.composite.upload_path,
        parts.uri.query(),
        correlation_headers(&parts.headers),
        BodyPayload::Raw { bytes, content_type },
    )?;
    let stored = state
        .dispatcher
        .dispatch(upload.into_request()?)
        .await
        .map_err(|e| ProxyError::from_dispatch(&storage, &e, &path, request_id))?;

    if !stored.status.is_success() {
        tracing::info!(request_id = %request_id, status = %stored.status, "Storage rejected upload");
        metrics::record_composite("upload_rejected");
        return Ok(response::relay(stored));
    }

    let receipt = parse_receipt(&stored.body).ok_or_else(|| {
        tracing::error!(request_id = %request_id, upstream = %storage.name, "Upload response had no usable fileId");
        ProxyError::new(&storage.name, "upload response did not contain a file identifier", path.clone())
    })?;
    tracing::info!(request_id = %request_id, file_id = %receipt.file_id, "Upload stored");

    // 2. analyze
    let analyze = OutboundRequest::to(
        &analysis,
        Method::POST,
        &state.composite.analyze_path,
        None,
        correlation_headers(&parts.headers),
        BodyPayload::Json(json!({ "fileId": receipt.file_id }).to_string()),
    )?;

    let analyzed = match state.dispatcher.dispatch(analyze.into_request()?).await {
        Ok(resp) if resp.status.is_success() => parse_report(&resp.body).ok_or_else(|| {
            ProxyError::new(&analysis.name, "analysis response was not a valid report", path.clone())
        }),
        Ok(resp) => Err(ProxyError::new(
            &analysis.name,
            format!("analysis upstream responded with status {}", resp.status.as_u16()),
            path.clone(),
        )),
        Err(e) => Err(ProxyError::from_dispatch(&analysis, &e, &path, request_id)),
    };

    let outcome = match analyzed {
        Ok(report) => {
            metrics::record_composite("completed");
            CompositeOutcome::completed(receipt, report)
        }
        Err(failure) => {
            tracing::warn!(
                request_id = %request_id,
                file_id = %receipt.file_id,
                reason = %failure.message,
                "Analysis unavailable, upload kept"
            );
            metrics::record_composite("analysis_unavailable");
            CompositeOutcome::analysis_unavailable(receipt, failure)
        }
    };

    Ok((outcome.status(), Json(outcome)).into_response())
}
