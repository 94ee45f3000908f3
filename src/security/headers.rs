//! Header forwarding policy.
//!
//! # Responsibilities
//! - Declare, per header, whether it crosses the gateway in each direction
//! - Copy header maps according to that table
//!
//! # Design Decisions
//! - One table instead of scattered name comparisons
//! - Headers not listed are forwarded in both directions, every value kept
//! - Framing headers are never copied; the buffered body defines them

use axum::http::{header, HeaderMap, HeaderName};

/// Which way a header map is being copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client request → upstream request.
    Inbound,
    /// Upstream response → client response.
    Outbound,
}

/// Forwarding rule for one header name.
#[derive(Debug, Clone)]
pub struct HeaderRule {
    pub name: HeaderName,
    pub forward_inbound: bool,
    pub forward_outbound: bool,
}

/// Headers with non-default forwarding behaviour.
pub static HEADER_POLICY: &[HeaderRule] = &[
    // The upstream authority comes from its base URL.
    HeaderRule { name: header::HOST, forward_inbound: false, forward_outbound: true },
    HeaderRule { name: header::CONTENT_LENGTH, forward_inbound: false, forward_outbound: false },
    HeaderRule { name: header::TRANSFER_ENCODING, forward_inbound: false, forward_outbound: false },
];

/// Returns true if `name` may be copied in `direction`.
pub fn is_forwarded(name: &HeaderName, direction: Direction) -> bool {
    match HEADER_POLICY.iter().find(|rule| rule.name == *name) {
        Some(rule) => match direction {
            Direction::Inbound => rule.forward_inbound,
            Direction::Outbound => rule.forward_outbound,
        },
        None => true,
    }
}

/// Copy every permitted header, preserving repeated values.
pub fn filter_headers(source: &HeaderMap, direction: Direction) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        if is_forwarded(name, direction) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}
