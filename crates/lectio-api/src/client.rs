//! HTTP client for the reading backend.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, status_message};
use crate::models::{ItemTextDto, ProgressPayload, QueueResponseDto};

/// Queue page size requested from the backend.
const QUEUE_LIMIT: u32 = 50;

/// Backend API client.
///
/// Thin request/decode layer: classification of failures into the core
/// error set happens in the `BackendPort` implementation.
pub struct LectioApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl LectioApiClient {
    /// Create a client from a validated configuration.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("failed to create HTTP client");
        Self { http, config }
    }

    /// `GET /playback/queue`
    pub async fn get_queue(&self) -> ApiResult<QueueResponseDto> {
        let url = self
            .config
            .endpoint(&format!("/playback/queue?include_done=true&limit={QUEUE_LIMIT}"));
        self.get_json(&url).await
    }

    /// `GET /items/{id}/text`
    pub async fn get_item_text(&self, item_id: i64) -> ApiResult<ItemTextDto> {
        let url = self.config.endpoint(&format!("/items/{item_id}/text"));
        self.get_json(&url).await
    }

    /// `POST /items/{id}/progress`
    pub async fn post_progress(
        &self,
        item_id: i64,
        percent: i32,
        source: Option<&str>,
    ) -> ApiResult<()> {
        let url = self.config.endpoint(&format!("/items/{item_id}/progress"));
        let payload = ProgressPayload {
            percent,
            source: source.map(str::to_string),
        };
        self.execute_no_body(self.http.post(url).json(&payload))
            .await
    }

    /// GET with automatic retry for transient failures.
    ///
    /// Network errors and 5xx responses back off exponentially up to the
    /// configured retry count. Progress posts go through [`Self::execute`]
    /// single-shot instead: their retry story is the durable outbox.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..=self.config.max_retries() {
            if attempt > 0 {
                let delay = Duration::from_millis(
                    self.config.retry_base_delay_ms() * 2u64.pow(u32::from(attempt) - 1),
                );
                tokio::time::sleep(delay).await;
            }

            match self.execute(self.http.get(url)).await {
                Ok(body) => return Ok(serde_json::from_str(&body)?),
                Err(error) => {
                    let transient = match &error {
                        ApiError::Network(_) => true,
                        ApiError::RequestFailed { status, .. } => *status >= 500,
                        _ => false,
                    };
                    if !transient {
                        return Err(error);
                    }
                    tracing::debug!(attempt, %error, "transient backend read failure");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::RequestFailed {
            status: 0,
            message: "Unknown error during fetch".to_string(),
        }))
    }

    async fn execute_no_body(&self, request: reqwest::RequestBuilder) -> ApiResult<()> {
        self.execute(request).await?;
        Ok(())
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> ApiResult<String> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.config.token()))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "backend request failed");
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                message: status_message(status.as_u16(), &body),
            });
        }
        Ok(body)
    }
}
