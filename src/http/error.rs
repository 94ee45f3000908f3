//! Gateway error taxonomy and its JSON rendering.
//!
//! Every failure the gateway reports goes through [`GatewayError`], so each
//! error response is a JSON object with at least `error` and `message`.
//! Transport failures keep their cause in logs only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::upstream::{DispatchError, Upstream};

/// A failed upstream exchange, as shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyError {
    /// Logical name of the failing upstream.
    #[serde(skip)]
    pub upstream: String,
    /// `"<Upstream> error"`.
    pub error: String,
    /// Human readable description.
    pub message: String,
    /// Original inbound request path.
    pub path: String,
}

impl ProxyError {
    pub fn new(upstream: &str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            upstream: upstream.to_string(),
            error: format!("{} error", upstream),
            message: message.into(),
            path: path.into(),
        }
    }

    /// Map a dispatch failure, logging the underlying cause.
    pub fn from_dispatch(upstream: &Upstream, err: &DispatchError, path: &str, request_id: &str) -> Self {
        tracing::error!(
            request_id = %request_id,
            upstream = %upstream.name,
            kind = err.kind(),
            error = ?err,
            path = %path,
            "Upstream request failed"
        );
        crate::observability::metrics::record_upstream_failure(&upstream.name, err.kind());
        Self::new(&upstream.name, err.to_string(), path)
    }
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// All errors surfaced by the gateway's HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed client input (400).
    #[error("{message}")]
    Validation {
        error: String,
        message: String,
        /// Extra fields merged into the body.
        details: Option<Value>,
    },

    /// No route for the path (404).
    #[error("no route for {path}")]
    NotFound { path: String },

    /// Path exists but not for this method (405).
    #[error("{method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    /// Body exceeds the configured limit (413).
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Upstream transport failure (502).
    #[error("{0}")]
    Upstream(ProxyError),

    /// Upstream health probe failed (503).
    #[error("{upstream} unavailable: {message}")]
    Unavailable { upstream: String, message: String },

    /// Anything else (500). The message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(error: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayError::Validation {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Validation error pointing callers at the composite upload endpoint.
    pub fn multipart_rejected() -> Self {
        Self::validation(
            "Use /api/files/upload-with-analysis endpoint",
            "multipart/form-data uploads are only accepted by POST /api/files/upload-with-analysis",
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation { .. } => StatusCode::BAD_REQUEST,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for this error.
    pub fn body(&self) -> Value {
        match self {
            GatewayError::Validation { error, message, details } => {
                let mut body = json!({ "error": error, "message": message });
                if let (Some(Value::Object(extra)), Value::Object(map)) = (details, &mut body) {
                    for (k, v) in extra {
                        map.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
                body
            }
            GatewayError::NotFound { path } => json!({
                "error": "Not found",
                "message": "No route matches the requested path",
                "path": path,
            }),
            GatewayError::MethodNotAllowed { method, path } => json!({
                "error": "Method not allowed",
                "message": format!("{} is not supported on this path", method),
                "path": path,
            }),
            GatewayError::PayloadTooLarge { limit } => json!({
                "error": "Payload too large",
                "message": format!("Request body exceeds the {} byte limit", limit),
            }),
            GatewayError::Upstream(proxy) => json!(proxy),
            GatewayError::Unavailable { upstream, message } => json!({
                "error": format!("{} unavailable", upstream),
                "message": message,
            }),
            GatewayError::Internal(_) => json!({
                "error": "Internal server error",
                "message": "An unexpected error occurred",
            }),
        }
    }
}

impl From<ProxyError> for GatewayError {
    fn from(err: ProxyError) -> Self {
        GatewayError::Upstream(err)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "Unexpected gateway error");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_error_body() {
        let err = GatewayError::from(ProxyError::new("FileService", "upstream connection failed", "/api/files/x"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.body(),
            json!({
                "error": "FileService error",
                "message": "upstream connection failed",
                "path": "/api/files/x",
            })
        );
    }

    #[test]
    fn test_validation_details_merge() {
        let err = GatewayError::Validation {
            error: "Invalid ID format".into(),
            message: "work id must be a UUID".into(),
            details: Some(json!({ "workId": "abc", "error": "ignored" })),
        };
        let body = err.body();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid ID format");
        assert_eq!(body["workId"], "abc");
    }

    #[test]
    fn test_internal_hides_detail() {
        let err = GatewayError::Internal("thread 'main' panicked at src/lib.rs:1".into());
        let body = err.body().to_string();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("panicked"));
        assert!(body.contains("\"message\""));
    }

    #[test]
    fn test_every_variant_has_error_and_message() {
        let variants = vec![
            GatewayError::multipart_rejected(),
            GatewayError::NotFound { path: "/x".into() },
            GatewayError::MethodNotAllowed { method: "PUT".into(), path: "/health".into() },
            GatewayError::PayloadTooLarge { limit: 10 },
            GatewayError::Upstream(ProxyError::new("AnalysisService", "m", "/p")),
            GatewayError::Unavailable { upstream: "FileService".into(), message: "down".into() },
            GatewayError::Internal("boom".into()),
        ];
        for err in variants {
            let body = err.body();
            assert!(body["error"].is_string(), "{:?}", err);
            assert!(body["message"].is_string(), "{:?}", err);
        }
    }
}
