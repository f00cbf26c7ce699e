//! Wires routes, middleware, and state into a runnable `axum` server.

use std::net::SocketAddr;

use axum::http::HeaderName;
use axum::Router;
use oss_watch_core::Result;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Bind address and per-request limits for [`ApiServer`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub max_body_size: usize,
}

impl ApiConfig {
    pub fn from_state(state: &AppState) -> Result<Self> {
        let bind_addr = state
            .config
            .server_bind_addr
            .parse()
            .map_err(|e| oss_watch_core::Error::ValidationError(format!("invalid server_bind_addr: {e}")))?;
        Ok(Self {
            bind_addr,
            max_body_size: state.config.max_body_size,
        })
    }
}

/// The bound `axum` application.
pub struct ApiServer {
    config: ApiConfig,
    router: Router,
}

impl ApiServer {
    /// Build the router for the given state and bind configuration.
    pub fn new(state: AppState, config: ApiConfig) -> Self {
        let router = Self::build_router(state, config.max_body_size);
        Self { config, router }
    }

    fn build_router(state: AppState, max_body_size: usize) -> Router {
        let header = HeaderName::from_static(REQUEST_ID_HEADER);

        routes::api_router(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
            .layer(RequestBodyLimitLayer::new(max_body_size))
    }

    /// The address this server will bind to.
    pub fn addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Build a `Router` clone, for tests that drive it with
    /// `tower::ServiceExt::oneshot` without binding a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run until the process is killed.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| oss_watch_core::Error::UpstreamUnavailable(format!("bind failed: {e}")))?;

        tracing::info!(addr = %self.config.bind_addr, "oss-watch-server listening");

        axum::serve(listener, self.router)
            .await
            .map_err(|e| oss_watch_core::Error::UpstreamUnavailable(format!("server error: {e}")))?;
        Ok(())
    }

    /// Run until `shutdown_signal` resolves, draining in-flight requests first.
    pub async fn run_until<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| oss_watch_core::Error::UpstreamUnavailable(format!("bind failed: {e}")))?;

        tracing::info!(addr = %self.config.bind_addr, "oss-watch-server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| oss_watch_core::Error::UpstreamUnavailable(format!("server error: {e}")))?;

        tracing::info!("oss-watch-server shutdown complete");
        Ok(())
    }
}
