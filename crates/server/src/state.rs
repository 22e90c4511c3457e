//! Application state shared across handlers.

use assay_core::config::AppConfig;
use assay_metadata::MetadataStore;
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
        }
    }

    /// Request body limit for JSON endpoints.
    pub fn max_body_size(&self) -> usize {
        self.config.server.max_body_size
    }
}
