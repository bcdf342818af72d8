//! Application state for the API server

use crate::config::Config;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the batch orchestrator and configuration.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Orchestrator shared by every incoming batch
    pub orchestrator: Orchestrator,

    /// Configuration (read-only at runtime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: Orchestrator, config: Arc<Config>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }
}
