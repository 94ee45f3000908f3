//! Request handling and translation.
//!
//! # Responsibilities
//! - Read the request ID assigned by the request-id layers
//! - Build the outbound request: method, upstream URI, filtered headers, body
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The query string is carried over byte-for-byte
//! - The payload's own content-type replaces the inbound one when it has one

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};

use crate::http::body::BodyPayload;
use crate::http::error::GatewayError;
use crate::routing::RouteMatch;
use crate::security::headers::{filter_headers, Direction};
use crate::upstream::Upstream;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Access to the request ID stored in a header map.
pub trait RequestIdExt {
    /// The request ID, or `"unknown"` when absent.
    fn request_id(&self) -> String;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> String {
        self.get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string()
    }
}

/// A fully prepared upstream request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub payload: BodyPayload,
}

impl OutboundRequest {
    /// Translate an inbound request for the matched route.
    pub fn translate(
        method: Method,
        inbound_headers: &HeaderMap,
        query: Option<&str>,
        route: &RouteMatch,
        payload: BodyPayload,
    ) -> Result<Self, GatewayError> {
        Self::to(
            &route.upstream,
            method,
            &route.path,
            query,
            filter_headers(inbound_headers, Direction::Inbound),
            payload,
        )
    }

    /// Build a request for `path` on `upstream`.
    ///
    /// `headers` must already be filtered for the inbound direction.
    pub fn to(
        upstream: &Upstream,
        method: Method,
        path: &str,
        query: Option<&str>,
        mut headers: HeaderMap,
        payload: BodyPayload,
    ) -> Result<Self, GatewayError> {
        if matches!(payload, BodyPayload::RejectedMultipart) {
            return Err(GatewayError::multipart_rejected());
        }

        let target = upstream.target(path, query);
        let uri: Uri = target.parse().map_err(|_| {
            GatewayError::validation("Invalid request path", "The request path cannot be forwarded")
        })?;

        if let Some(content_type) = payload.content_type() {
            headers.insert(header::CONTENT_TYPE, content_type);
        }

        Ok(Self {
            method,
            uri,
            headers,
            payload,
        })
    }

    /// Convert into a request the dispatcher can send.
    pub fn into_request(self) -> Result<Request<Body>, GatewayError> {
        let body = match &self.payload {
            BodyPayload::None => Body::empty(),
            payload => Body::from(payload.encode()?),
        };

        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers;
        }
        builder
            .body(body)
            .map_err(|e| GatewayError::Internal(format!("failed to build upstream request: {}", e)))
    }
}

/// Headers for a request the gateway originates itself: only the request ID
/// is carried over.
pub fn correlation_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(id) = inbound.get(X_REQUEST_ID) {
        headers.insert(X_REQUEST_ID, id.clone());
    }
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use std::sync::Arc;

    fn route(path: &str) -> RouteMatch {
        RouteMatch {
            prefix: "/api/files".into(),
            upstream: Arc::new(Upstream::new("files", "FileService", "http://file-service:8080")),
            path: path.into(),
        }
    }

    fn inbound_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("gateway:5000"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("3"));
        headers.append("x-student", HeaderValue::from_static("1"));
        headers.append("x-student", HeaderValue::from_static("2"));
        headers
    }

    #[test]
    fn test_uri_and_headers() {
        let outbound = OutboundRequest::translate(
            Method::GET,
            &inbound_headers(),
            Some("page=2&sort=name%20asc"),
            &route("/abc123/metadata"),
            BodyPayload::None,
        )
        .unwrap();

        assert_eq!(
            outbound.uri.to_string(),
            "http://file-service:8080/abc123/metadata?page=2&sort=name%20asc"
        );
        assert!(outbound.headers.get(header::HOST).is_none());
        assert!(outbound.headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(outbound.headers.get_all("x-student").iter().count(), 2);
        assert_eq!(outbound.headers.get(header::CONTENT_TYPE).unwrap(), "text/csv");
    }

    #[test]
    fn test_payload_content_type_wins() {
        let outbound = OutboundRequest::translate(
            Method::POST,
            &inbound_headers(),
            None,
            &route("/x"),
            BodyPayload::Json("{}".into()),
        )
        .unwrap();

        let values: Vec<_> = outbound.headers.get_all(header::CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["application/json; charset=utf-8"]);
    }

    #[test]
    fn test_multipart_payload_rejected() {
        let err = OutboundRequest::translate(
            Method::POST,
            &HeaderMap::new(),
            None,
            &route("/upload"),
            BodyPayload::RejectedMultipart,
        )
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_into_request_carries_body() {
        let payload = BodyPayload::Raw {
            bytes: Bytes::from_static(b"a,b\n1,2\n"),
            content_type: Some(HeaderValue::from_static("text/csv")),
        };
        let request = OutboundRequest::translate(Method::PUT, &inbound_headers(), None, &route("/f"), payload)
            .unwrap()
            .into_request()
            .unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert!(request.headers().get(header::HOST).is_none());
        let body = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"a,b\n1,2\n");
    }

    #[test]
    fn test_request_id_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(headers.request_id(), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(headers.request_id(), "abc");
        assert_eq!(correlation_headers(&headers).get(X_REQUEST_ID).unwrap(), "abc");
    }
}
