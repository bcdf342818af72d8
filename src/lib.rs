//! # url-multiplexer
//!
//! HTTP service that fetches a batch of URLs concurrently under one deadline.
//!
//! A client posts `{"urls": [...]}` to `/`. Every URL is fetched in its own
//! task; the caller gets back either all bodies, in request order, or the
//! first failure. Nothing partial is ever returned.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use url_multiplexer::{Config, run_until_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::load(None)?);
//!     run_until_signal(config).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP API server
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Single-URL fetching
pub mod fetcher;
/// Batch fan-out/fan-in
pub mod orchestrator;
/// Batch request/response types
pub mod types;

// Re-export commonly used types
pub use api::{ApiServer, create_router};
pub use config::{Config, FetchConfig, ServerConfig};
pub use error::{Error, FetchError, Result, ToHttpStatus, ValidationError};
pub use fetcher::{Fetch, ReqwestFetcher};
pub use orchestrator::{Orchestrator, SlotArray};
pub use types::{BatchRequest, BatchResponse, FetchOutcome, OrchestrationResult};

use std::future::Future;
use std::time::Duration;

/// Log filter the binary installs when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "url_multiplexer=info,tower_http=info";

/// Bind the configured address and serve until SIGINT/SIGTERM.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_until_signal(config: std::sync::Arc<Config>) -> Result<()> {
    let shutdown_timeout = config.server.shutdown_timeout;
    let server = ApiServer::bind(config).await?;
    run_with_shutdown(server, wait_for_signal(), shutdown_timeout).await
}

/// Serve `server` until `signal` resolves or the listener fails, then shut
/// down gracefully within `shutdown_timeout`.
///
/// A shutdown that overruns its budget is logged and the server task is
/// aborted; it is not treated as an error. A listener failure is returned
/// after shutdown.
pub async fn run_with_shutdown(
    server: ApiServer,
    signal: impl Future<Output = ()>,
    shutdown_timeout: Duration,
) -> Result<()> {
    let shutdown = server.shutdown_token();
    let mut serve = tokio::spawn(server.serve());

    let server_result = tokio::select! {
        _ = signal => {
            tracing::info!("Shutdown signal received");
            None
        }
        joined = &mut serve => {
            let result = flatten_join(joined);
            if let Err(e) = &result {
                tracing::error!(error = %e, "API server is down");
            }
            Some(result)
        }
    };

    tracing::info!(budget_ms = shutdown_timeout.as_millis() as u64, "Initiating graceful shutdown");
    shutdown.cancel();

    match server_result {
        Some(result) => result,
        None => match tokio::time::timeout(shutdown_timeout, &mut serve).await {
            Ok(joined) => {
                let result = flatten_join(joined);
                match &result {
                    Ok(()) => tracing::info!("Shutdown complete"),
                    Err(e) => tracing::warn!(error = %e, "API server failed while shutting down"),
                }
                result
            }
            Err(_) => {
                tracing::warn!("Graceful shutdown exceeded its budget, aborting in-flight requests");
                serve.abort();
                Ok(())
            }
        },
    }
}

fn flatten_join(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| Error::ApiServerError(format!("server task failed: {e}")))?
}

/// Resolves on SIGTERM or SIGINT. Falls back to Ctrl+C if the handlers
/// cannot be registered.
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            tracing::info!(signal = name, "Stop requested");
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Signal handlers unavailable, waiting for Ctrl+C");
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(signal = "Ctrl+C", "Stop requested"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
