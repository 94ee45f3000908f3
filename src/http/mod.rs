//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, panic capture)
//!     → routing (longest prefix → upstream + rewritten path)
//!     → body.rs (buffer, classify, decode by content type)
//!     → request.rs (filter headers, re-encode, build outbound request)
//!     → upstream dispatcher (one attempt, bounded by timeout)
//!     → response.rs (filter headers, fix Content-Length)
//!     → Send to client
//! ```
//!
//! Fixed endpoints (health, report alias, composite upload) bypass the
//! routing table; everything else goes through the generic proxy.

pub mod aliases;
pub mod body;
pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::{GatewayError, ProxyError};
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
