//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → body size limit (buffered read bound, see http::body)
//!     → headers.rs (drop Host and framing headers before forwarding)
//!
//! Upstream response:
//!     → headers.rs (drop framing headers before relaying)
//! ```
//!
//! # Design Decisions
//! - Header handling is table-driven and direction-aware
//! - Oversized bodies are rejected before any upstream call

pub mod headers;

pub use headers::{filter_headers, is_forwarded, Direction, HeaderRule, HEADER_POLICY};
