//! Error types for the persistence collaborators

use thiserror::Error;

/// Failure reported by a configuration or report-history store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no report with timestamp {0}")]
    NotFound(i64),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
