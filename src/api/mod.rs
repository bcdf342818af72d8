//! HTTP API server module
//!
//! Exposes the single batch endpoint and owns the listener lifecycle.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::ReqwestFetcher;
use crate::orchestrator::Orchestrator;
use axum::{Router, routing::post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod error_response;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the API router
///
/// # Routes
///
/// - `POST /` - Fetch a batch of URLs
///
/// Every other method or path answers 404 with a plain-text `404` body.
/// Each request is logged at INFO when it starts and when it finishes.
pub fn create_router(orchestrator: Orchestrator, config: Arc<Config>) -> Router {
    let state = AppState::new(orchestrator, config);

    Router::new()
        .route(
            "/",
            post(routes::fetch_batch).fallback(routes::not_found),
        )
        .fallback(routes::not_found)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// A bound, not yet serving, API server.
///
/// Binding and serving are split so callers (and tests) can learn the actual
/// local address before traffic starts, and hold a shutdown token.
#[derive(Debug)]
pub struct ApiServer {
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
}

impl ApiServer {
    /// Bind the configured address using the production fetcher
    pub async fn bind(config: Arc<Config>) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(&config.fetch)?;
        let orchestrator = Orchestrator::new(fetcher, config.fetch.request_deadline);
        Self::bind_with(orchestrator, config).await
    }

    /// Bind the configured address, serving batches through `orchestrator`
    pub async fn bind_with(orchestrator: Orchestrator, config: Arc<Config>) -> Result<Self> {
        let bind_address = config.server.bind_address;

        let listener = TcpListener::bind(bind_address).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind {bind_address}: {e}"),
            ))
        })?;

        tracing::info!(
            address = %bind_address,
            max_urls = config.fetch.max_urls,
            deadline_ms = config.fetch.request_deadline.as_millis() as u64,
            "API server bound"
        );

        Ok(Self {
            listener,
            router: create_router(orchestrator, config),
            shutdown: CancellationToken::new(),
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Token that stops accepting connections and drains in-flight requests
    /// when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until the shutdown token is cancelled or the listener fails
    pub async fn serve(self) -> Result<()> {
        let address = self.local_addr()?;
        tracing::info!(address = %address, "API server listening");

        let shutdown = self.shutdown;
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| Error::ApiServerError(e.to_string()))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
