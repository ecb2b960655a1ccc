//! Internal error types for backend API operations.
//!
//! These errors are internal to `lectio-api` and are mapped to the core
//! `BackendError` set at the port boundary.

use thiserror::Error;

/// Result type alias for backend API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors related to backend API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// API request failed with an HTTP error status.
    #[error("{message}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// Display message derived from the status and body
        message: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Build the display message for an HTTP error status.
pub fn status_message(status: u16, body: &str) -> String {
    match status {
        401 => "Unauthorized - check token".to_string(),
        403 => "Forbidden".to_string(),
        _ => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {trimmed}")
            }
        }
    }
}
