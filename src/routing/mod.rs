//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup, longest prefix first)
//!     → matcher.rs (case-insensitive prefix strip)
//!     → Return: RouteMatch { upstream, rewritten path } or None
//!
//! Route Compilation (at startup):
//!     RouteConfig[] + UpstreamRegistry
//!     → resolve upstream keys
//!     → sort by prefix length
//!     → freeze as immutable PathRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{PathRouter, RouteMatch};
