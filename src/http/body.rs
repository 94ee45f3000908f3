//! Request body materialization.
//!
//! # Responsibilities
//! - Decide from method and content-type how a body is carried upstream
//! - Read the whole body into memory, bounded by the configured limit
//! - Re-encode form bodies, pass JSON and everything else through verbatim
//!
//! # Design Decisions
//! - The strategy is chosen once per request; payload variants never mix
//! - Multipart is never read on the generic path (it belongs to the
//!   upload-with-analysis operation)
//! - Only POST, PUT and PATCH carry a body upstream

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use http_body_util::LengthLimitError;

use crate::http::error::GatewayError;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body transfer strategy derived from the content-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Multipart,
    FormUrlEncoded,
    Json,
    Raw,
}

impl BodyKind {
    /// Classify by media type essence, ignoring case and parameters.
    pub fn of(content_type: Option<&HeaderValue>) -> Self {
        let essence = content_type
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        match essence.as_deref() {
            Some("multipart/form-data") => BodyKind::Multipart,
            Some("application/x-www-form-urlencoded") => BodyKind::FormUrlEncoded,
            Some("application/json") => BodyKind::Json,
            _ => BodyKind::Raw,
        }
    }
}

/// The body sent upstream. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyPayload {
    None,
    RejectedMultipart,
    FormUrlEncoded(Vec<(String, String)>),
    Json(String),
    Raw {
        bytes: Bytes,
        content_type: Option<HeaderValue>,
    },
}

impl BodyPayload {
    /// Content-type to send with this payload, if any.
    pub fn content_type(&self) -> Option<HeaderValue> {
        match self {
            BodyPayload::None | BodyPayload::RejectedMultipart => None,
            BodyPayload::FormUrlEncoded(_) => Some(HeaderValue::from_static(FORM_CONTENT_TYPE)),
            BodyPayload::Json(_) => Some(HeaderValue::from_static(JSON_CONTENT_TYPE)),
            BodyPayload::Raw { content_type, .. } => content_type.clone(),
        }
    }

    /// Encoded bytes for the wire.
    pub fn encode(&self) -> Result<Bytes, GatewayError> {
        match self {
            BodyPayload::None => Ok(Bytes::new()),
            BodyPayload::RejectedMultipart => Err(GatewayError::multipart_rejected()),
            BodyPayload::FormUrlEncoded(pairs) => Ok(Bytes::from(
                form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish(),
            )),
            BodyPayload::Json(text) => Ok(Bytes::from(text.clone())),
            BodyPayload::Raw { bytes, .. } => Ok(bytes.clone()),
        }
    }

    /// Label for logs.
    pub fn variant(&self) -> &'static str {
        match self {
            BodyPayload::None => "none",
            BodyPayload::RejectedMultipart => "rejected-multipart",
            BodyPayload::FormUrlEncoded(_) => "form-urlencoded",
            BodyPayload::Json(_) => "json",
            BodyPayload::Raw { .. } => "raw-bytes",
        }
    }
}

/// Returns true for methods whose body is forwarded.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Read and classify an inbound body.
pub async fn materialize(
    method: &Method,
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<BodyPayload, GatewayError> {
    if !carries_body(method) {
        return Ok(BodyPayload::None);
    }

    let content_type = headers.get(header::CONTENT_TYPE);
    let kind = BodyKind::of(content_type);
    if kind == BodyKind::Multipart {
        return Ok(BodyPayload::RejectedMultipart);
    }

    let bytes = read_limited(headers, body, limit).await?;
    decode(kind, content_type.cloned(), bytes)
}

/// Build the payload for an already buffered body.
pub fn decode(
    kind: BodyKind,
    content_type: Option<HeaderValue>,
    bytes: Bytes,
) -> Result<BodyPayload, GatewayError> {
    match kind {
        BodyKind::Multipart => Ok(BodyPayload::RejectedMultipart),
        BodyKind::FormUrlEncoded => Ok(BodyPayload::FormUrlEncoded(
            form_urlencoded::parse(&bytes).into_owned().collect(),
        )),
        BodyKind::Json => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Ok(BodyPayload::Json(text)),
            Err(_) => Err(GatewayError::validation(
                "Invalid JSON body",
                "application/json bodies must be UTF-8 encoded",
            )),
        },
        BodyKind::Raw => Ok(BodyPayload::Raw { bytes, content_type }),
    }
}

/// Buffer a body, rejecting anything over `limit` bytes.
pub async fn read_limited(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(GatewayError::PayloadTooLarge { limit });
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            GatewayError::PayloadTooLarge { limit }
        } else {
            GatewayError::validation("Invalid request body", "The request body could not be read")
        }
    })
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
