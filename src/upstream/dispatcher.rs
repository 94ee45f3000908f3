//! Upstream dispatch.
//!
//! # Responsibilities
//! - Own the shared, pooled HTTP client
//! - Send exactly one request per call (no retries)
//! - Buffer the complete response body before returning
//! - Enforce the per-exchange deadline
//!
//! # Design Decisions
//! - A non-2xx status is a successful exchange; only transport problems fail
//! - The deadline covers connect, headers and body together
//! - Errors carry no upstream detail in their Display output

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::ClientConfig;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Transport-level failure talking to an upstream.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("upstream connection failed")]
    Connect(#[source] hyper_util::client::legacy::Error),
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
    #[error("upstream request failed")]
    Transport(#[source] hyper_util::client::legacy::Error),
    #[error("upstream response body could not be read")]
    Body(#[source] axum::Error),
}

impl DispatchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Connect(_) => "connect",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Transport(_) => "transport",
            DispatchError::Body(_) => "body",
        }
    }
}

/// Sends requests to upstreams over one shared connection pool.
///
/// Cloning is cheap: clones share the underlying pool.
#[derive(Clone)]
pub struct UpstreamDispatcher {
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl UpstreamDispatcher {
    /// Build the client from explicit pool and timeout settings.
    pub fn new(config: &ClientConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build(connector);

        Self {
            client,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    /// Send with the configured request timeout.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<UpstreamResponse, DispatchError> {
        self.dispatch_with_timeout(request, self.request_timeout).await
    }

    /// Send once and buffer the whole response, failing if `timeout` elapses first.
    pub async fn dispatch_with_timeout(
        &self,
        request: Request<Body>,
        timeout: Duration,
    ) -> Result<UpstreamResponse, DispatchError> {
        let exchange = async {
            let response: hyper::Response<Incoming> = self.client.request(request).await.map_err(|e| {
                if e.is_connect() {
                    DispatchError::Connect(e)
                } else {
                    DispatchError::Transport(e)
                }
            })?;

            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(DispatchError::Body)?;

            Ok(UpstreamResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn dispatcher() -> UpstreamDispatcher {
        UpstreamDispatcher::new(&ClientConfig {
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
            health_timeout_secs: 1,
            pool_max_idle_per_host: 0,
            pool_idle_timeout_secs: 1,
        })
    }

    fn get(url: String) -> Request<Body> {
        Request::builder().uri(url).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 19\r\nConnection: close\r\n\r\n{\"msg\":\"not found\"}")
                .await;
        });

        let response = dispatcher().dispatch(get(format!("http://{}/x", addr))).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(&response.body[..], br#"{"msg":"not found"}"#);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = dispatcher().dispatch(get(format!("http://{}/", addr))).await.unwrap_err();
        assert_eq!(err.kind(), "connect");
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = dispatcher()
            .dispatch_with_timeout(get(format!("http://{}/", addr)), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Timeout(_)));
        assert_eq!(err.to_string(), "upstream did not respond within 200ms");
    }
}
