//! Error types for collectors_vault

use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the remote card catalog or name taxonomy
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Upstream answered 429 Too Many Requests
    #[error("Rate limited by the card catalog (HTTP 429)")]
    RateLimited { retry_after: Option<Duration> },
    /// Any other non-success HTTP status
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Suggestion source has nothing to offer yet (e.g. taxonomy fetch failed)
    #[error("Suggestion source unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// True when the upstream asked us to back off
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CatalogError::RateLimited { .. })
    }
}

/// Errors raised by the collection persistence layer
#[derive(Debug, Error)]
pub enum StorageError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Failed to serialize the collection
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Stored value exists but cannot be read back
    #[error("Stored collection under '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
