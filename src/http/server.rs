//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, panic capture)
//! - Bind server to listener
//! - Dispatch generic requests through the routing table to upstreams
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::composite::{self, UPLOAD_WITH_ANALYSIS_PATH};
use crate::config::{CompositeConfig, GatewayConfig, ReportsConfig};
use crate::health;
use crate::http::{aliases, body, response};
use crate::http::error::{GatewayError, ProxyError};
use crate::http::request::{OutboundRequest, RequestIdExt};
use crate::observability::metrics;
use crate::routing::{PathRouter, RouteMatch};
use crate::upstream::{UpstreamDispatcher, UpstreamRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<PathRouter>,
    pub upstreams: Arc<UpstreamRegistry>,
    pub dispatcher: UpstreamDispatcher,
    pub composite: Arc<CompositeConfig>,
    pub reports: Arc<ReportsConfig>,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build every subsystem from a validated configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let upstreams = Arc::new(UpstreamRegistry::from_config(&config.upstreams));
        let router = Arc::new(PathRouter::from_config(&config.routes, &upstreams));

        Self {
            router,
            upstreams,
            dispatcher: UpstreamDispatcher::new(&config.client),
            composite: Arc::new(config.composite.clone()),
            reports: Arc::new(config.reports.clone()),
            max_body_bytes: config.limits.max_body_bytes,
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState::from_config(&config);

        tracing::info!(
            upstreams = state.upstreams.len(),
            routes = state.router.len(),
            request_timeout = ?state.dispatcher.request_timeout(),
            "Gateway state initialized"
        );

        let router = Self::build_router(state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(banner).fallback(method_not_allowed))
            .route("/health", get(health::gateway_health).fallback(method_not_allowed))
            .route(
                "/health/{upstream}",
                get(health::upstream_health).fallback(method_not_allowed),
            )
            .route("/reports/{id}", get(aliases::reports).fallback(method_not_allowed))
            .route(
                UPLOAD_WITH_ANALYSIS_PATH,
                post(composite::upload_with_analysis).fallback(composite::wrong_method),
            )
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn banner() -> &'static str {
    concat!("Submission Gateway API v", env!("CARGO_PKG_VERSION"))
}

async fn method_not_allowed(request: Request<Body>) -> GatewayError {
    GatewayError::MethodNotAllowed {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
    }
}

fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    metrics::record_panic();
    GatewayError::Internal("request handler panicked".to_string()).into_response()
}

/// Generic proxy handler.
/// Looks up the route, translates the request, and relays the upstream answer.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request.headers().request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        peer = %peer,
        method = %method,
        path = %path,
        "Proxying request"
    );

    let route = match state.router.match_path(&path) {
        Some(r) => r,
        None => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "none", start_time);
            return GatewayError::NotFound { path }.into_response();
        }
    };

    let upstream_name = route.upstream.name.clone();
    let response = match forward(&state, request, &route, &request_id).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        upstream = %upstream_name,
        status = response.status().as_u16(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(method.as_str(), response.status().as_u16(), &upstream_name, start_time);
    response
}

/// Translate → dispatch → relay, one attempt.
async fn forward(
    state: &AppState,
    request: Request<Body>,
    route: &RouteMatch,
    request_id: &str,
) -> Result<Response, GatewayError> {
    if route.upstream.key.eq_ignore_ascii_case(&state.composite.storage_upstream)
        && route.path.to_ascii_lowercase().contains("upload-with-analysis")
    {
        return Err(GatewayError::multipart_rejected());
    }

    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let payload = body::materialize(&parts.method, &parts.headers, body, state.max_body_bytes).await?;
    let outbound = OutboundRequest::translate(
        parts.method.clone(),
        &parts.headers,
        parts.uri.query(),
        route,
        payload,
    )?;

    tracing::debug!(
        request_id = %request_id,
        target = %outbound.uri,
        body = outbound.payload.variant(),
        "Dispatching upstream request"
    );

    let upstream_response = state
        .dispatcher
        .dispatch(outbound.into_request()?)
        .await
        .map_err(|e| ProxyError::from_dispatch(&route.upstream, &e, &path, request_id))?;

    Ok(response::relay(upstream_response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn explode() -> &'static str {
        panic!("db password is hunter2")
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_generic_500() {
        let app = Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(panic_response));

        let request = Request::builder().uri("/explode").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("panicked"));

        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert!(body["message"].is_string());
    }
}
