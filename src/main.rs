//! url-multiplexer service binary.
//!
//! Configuration comes from the TOML file named by `MULTIPLEXER_CONFIG` (if
//! set), then `MULTIPLEXER_*` environment overrides. Log verbosity follows
//! `RUST_LOG`.

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url_multiplexer::config::CONFIG_PATH_ENV;
use url_multiplexer::{Config, DEFAULT_LOG_FILTER, run_until_signal};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .init();

    let config_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    tracing::info!(config = ?config_path, "Initializing server");

    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    match run_until_signal(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server exited with error");
            std::process::ExitCode::FAILURE
        }
    }
}
