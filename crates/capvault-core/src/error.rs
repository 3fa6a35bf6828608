use thiserror::Error;

/// Application-wide error types for Capvault.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-2xx status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The backing store could not be reached, even after reconnecting.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error came from fetching a single catalog page.
    ///
    /// Fetch failures are recovered locally by the orchestrator and never
    /// abort a scrape run.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::Timeout(_) | AppError::NetworkError(_)
        )
    }

    /// Returns true if this error comes from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            AppError::StorageUnavailable(_) | AppError::DatabaseError(_)
        )
    }
}
