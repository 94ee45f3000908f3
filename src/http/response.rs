//! Response relay.
//!
//! # Responsibilities
//! - Copy the upstream status code verbatim
//! - Copy upstream headers through the outbound header policy
//! - Send the buffered body with a recomputed Content-Length
//!
//! # Design Decisions
//! - Bodies are fully buffered, so nothing reaches the client before the
//!   upstream exchange has completed
//! - Non-2xx responses are relayed like any other

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;

use crate::security::headers::{filter_headers, Direction};
use crate::upstream::UpstreamResponse;

/// Turn a buffered upstream response into the client response.
pub fn relay(upstream: UpstreamResponse) -> Response {
    let mut headers = filter_headers(&upstream.headers, Direction::Outbound);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(upstream.body.len()));

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = headers;
    response
}
