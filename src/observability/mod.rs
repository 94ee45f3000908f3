//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, dispatcher, health probes produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every log event a handler emits
//! - Per-request spans come from tower-http's TraceLayer

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
