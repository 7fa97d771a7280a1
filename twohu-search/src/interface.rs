//! Public service interface and error type.

use thiserror::Error;

use crate::models::{AuthorRecord, VideoRecord};

/// Error type for search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search query cannot be empty")]
    EmptyQuery,
    #[error("Retrieval error: {0}")]
    Retrieval(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl SearchError {
    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SearchError::EmptyQuery)
    }
}

impl From<crate::database::DatabaseError> for SearchError {
    fn from(e: crate::database::DatabaseError) -> Self {
        SearchError::Retrieval(e.to_string())
    }
}

impl From<crate::config::ConfigError> for SearchError {
    fn from(e: crate::config::ConfigError) -> Self {
        SearchError::Config(e.to_string())
    }
}

/// Ranked search over the video and author catalogue.
#[async_trait::async_trait]
pub trait SearchServiceApi: Send + Sync {
    /// Search videos by title. `limit` is raw caller input: missing or
    /// invalid values use the configured default, large values are clamped.
    async fn search_videos(&self, query: String, limit: Option<String>) -> Result<Vec<VideoRecord>, SearchError>;

    /// Search authors by any platform name.
    async fn search_authors(&self, query: String, limit: Option<String>) -> Result<Vec<AuthorRecord>, SearchError>;

    /// Number of live entries across response caches.
    fn cache_size(&self) -> usize;
}
