//! Submission gateway library.
//!
//! Single public entry point for a set of internal services: path-prefix
//! routing, request translation by content type, one-attempt dispatch and
//! the upload-then-analyze composite operation.

pub mod composite;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod upstream;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
