//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::MetadataRepository;
use crate::metrics::RequestMetrics;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for store lookups
    pub repository: Arc<dyn MetadataRepository>,
    /// Per-route request timers
    pub metrics: RequestMetrics,
}

impl AppState {
    /// Create a new application state with the given repository and metrics sink.
    pub fn new(repository: Arc<dyn MetadataRepository>, metrics: RequestMetrics) -> Self {
        Self {
            repository,
            metrics,
        }
    }
}
