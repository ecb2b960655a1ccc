//! Port trait implementation for `LectioApiClient`.
//!
//! Implements the core-owned `BackendPort` trait, converting wire DTOs into
//! domain types and classifying internal errors into the closed
//! `BackendError` set. Only connectivity-level failures become retryable;
//! every HTTP status is terminal.

use async_trait::async_trait;

use lectio_core::domain::{ItemText, QueueItem};
use lectio_core::ports::{BackendError, BackendPort};

use crate::client::LectioApiClient;
use crate::error::ApiError;
use crate::models::QueueItemDto;

/// Convert internal `ApiError` to core `BackendError`.
fn map_error(err: ApiError) -> BackendError {
    match err {
        ApiError::RequestFailed { status, message } => {
            if status == 401 || status == 403 {
                BackendError::Unauthorized
            } else {
                BackendError::Http { status, message }
            }
        }
        ApiError::Network(e) => BackendError::Transport(e.to_string()),
        ApiError::InvalidUrl(e) => BackendError::Decode(e.to_string()),
        ApiError::JsonParse(e) => BackendError::Decode(e.to_string()),
    }
}

#[async_trait]
impl BackendPort for LectioApiClient {
    async fn fetch_queue(&self) -> Result<Vec<QueueItem>, BackendError> {
        let response = self.get_queue().await.map_err(map_error)?;
        Ok(response
            .items
            .into_iter()
            .map(QueueItemDto::into_domain)
            .collect())
    }

    async fn fetch_item_text(&self, item_id: i64) -> Result<ItemText, BackendError> {
        let payload = self.get_item_text(item_id).await.map_err(map_error)?;
        Ok(payload.into_domain())
    }

    async fn post_progress(
        &self,
        item_id: i64,
        percent: i32,
        source: Option<&str>,
    ) -> Result<(), BackendError> {
        self.post_progress(item_id, percent, source)
            .await
            .map_err(map_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::status_message;

    #[test]
    fn test_auth_statuses_map_to_unauthorized() {
        for status in [401, 403] {
            let mapped = map_error(ApiError::RequestFailed {
                status,
                message: status_message(status, ""),
            });
            assert!(matches!(mapped, BackendError::Unauthorized));
            assert!(!mapped.is_retryable());
        }
    }

    #[test]
    fn test_other_statuses_stay_terminal_http_errors() {
        let mapped = map_error(ApiError::RequestFailed {
            status: 503,
            message: status_message(503, "maintenance"),
        });
        match mapped {
            BackendError::Http { status, ref message } => {
                assert_eq!(status, 503);
                assert!(message.contains("maintenance"));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
        assert!(!mapped.is_retryable());
    }

    #[test]
    fn test_json_failures_map_to_decode() {
        let json_err = serde_json::from_str::<QueueItemDto>("{").unwrap_err();
        let mapped = map_error(ApiError::JsonParse(json_err));
        assert!(matches!(mapped, BackendError::Decode(_)));
        assert!(!mapped.is_retryable());
    }
}
