use thiserror::Error;

/// Application-wide error types for pitwall.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Every configured endpoint failed for a resource.
    #[error("All endpoints failed for {path}: {last}")]
    FetchExhausted { path: String, last: Box<AppError> },

    /// Upstream answered with a valid but data-empty payload.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// The embedded payload could not be located in a page.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Writing an output table failed.
    #[error("Output error: {0}")]
    OutputError(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true if switching to another mirror could cure this error.
    pub fn is_fallback_worthy(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::Timeout(_) | AppError::NetworkError(_)
        )
    }

    /// Returns true for the "nothing to emit" kind callers may absorb.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, AppError::EmptyResult(_))
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::OutputError(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::OutputError(e.to_string())
    }
}
