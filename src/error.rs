//! Custom error types for doidates.
//!
//! Run-level failures (no identifier column, no input) surface through
//! [`DoiDatesError`]. Per-identifier failures use the same type but are
//! carried as values inside a [`crate::crossref::DateResult`] and never
//! abort a batch.

use thiserror::Error;

/// Main error type for doidates operations.
#[derive(Debug, Error)]
pub enum DoiDatesError {
    /// No column whose name contains the identifier token
    #[error("Could not find a column containing '{token}'")]
    ColumnNotFound {
        /// Token searched for (case-insensitive)
        token: String,
    },

    /// No input files loaded, or no identifiers left after filtering
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote lookup exceeded the per-request timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// External API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message
        message: String,
    },

    /// Response body or cell value could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `DoiDatesError`
pub type Result<T> = std::result::Result<T, DoiDatesError>;

impl DoiDatesError {
    /// Classify a reqwest failure, separating timeouts from other transport errors.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else {
            Self::Network(err)
        }
    }

    /// Whether this error is fatal to a whole run
    pub fn is_run_level(&self) -> bool {
        matches!(self, Self::ColumnNotFound { .. } | Self::EmptyInput(_))
    }
}
