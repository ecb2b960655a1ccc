//! Backend API port — trait abstraction over the reading-progress backend.
//!
//! Failures form a closed tagged set so the queue/retry machinery never has
//! to inspect free-text messages: only [`BackendError::Transport`] is
//! retryable; authorization and other HTTP failures are terminal.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ItemText, QueueItem};

/// Errors returned by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connectivity-level failure (DNS, connect, timeout, interrupted body).
    /// The only retryable class.
    #[error("Network error: {0}")]
    Transport(String),

    /// Credentials rejected (401/403). Retrying cannot succeed.
    #[error("Unauthorized - check token")]
    Unauthorized,

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response arrived but could not be decoded.
    #[error("Invalid response payload: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether queuing and retrying later can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Port trait for the reading backend.
///
/// Implemented by `lectio-api` over HTTP; consumed by the playback service
/// and the sync coordinator.
#[async_trait]
pub trait BackendPort: Send + Sync {
    /// Fetch the playback queue, most relevant items first.
    async fn fetch_queue(&self) -> Result<Vec<QueueItem>, BackendError>;

    /// Fetch the full text payload for one item.
    async fn fetch_item_text(&self, item_id: i64) -> Result<ItemText, BackendError>;

    /// Record reading progress for an item.
    async fn post_progress(
        &self,
        item_id: i64,
        percent: i32,
        source: Option<&str>,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_failures_are_retryable() {
        assert!(BackendError::Transport("connection refused".to_string()).is_retryable());
        assert!(!BackendError::Unauthorized.is_retryable());
        assert!(
            !BackendError::Http {
                status: 500,
                message: "internal".to_string()
            }
            .is_retryable()
        );
        assert!(!BackendError::Decode("truncated".to_string()).is_retryable());
    }
}
