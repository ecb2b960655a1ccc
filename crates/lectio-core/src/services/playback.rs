//! Playback data service.
//!
//! Orchestrates the backend, the content cache, and the pending progress
//! outbox: item text is served from the network with a version-checked cache
//! fallback, and progress posts that fail on transport are queued for a
//! background flush instead of surfacing an error.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{
    CachedItem, FlushOutcome, ItemText, MAX_FLUSH_ATTEMPTS, NewPendingProgress, QueueItem,
};
use crate::ports::{
    BackendError, BackendPort, ContentCacheRepository, FlushSchedulerPort,
    PendingProgressRepository, RepositoryError,
};
use crate::settings::MAX_PREFETCH_COUNT;

/// Longest error text persisted with an outbox entry.
const MAX_ERROR_CHARS: usize = 240;

/// Errors surfaced by the playback service.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Backend call failed and no fallback applied.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Local store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Offline, and the cached copy predates the expected content version.
    #[error("Offline and not cached for current active version (item {item_id})")]
    StaleCache { item_id: i64 },
}

/// Item text plus where it came from.
#[derive(Debug, Clone)]
pub struct ItemTextResult {
    pub payload: ItemText,
    pub using_cache: bool,
}

/// Result of a progress post attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPost {
    /// True when the update was queued for later delivery instead of sent.
    pub queued: bool,
}

/// Service for item text and progress delivery.
pub struct PlaybackService {
    backend: Arc<dyn BackendPort>,
    content_cache: Arc<dyn ContentCacheRepository>,
    pending_progress: Arc<dyn PendingProgressRepository>,
    flush_scheduler: Arc<dyn FlushSchedulerPort>,
    progress_source: Option<String>,
}

impl PlaybackService {
    /// Create a new playback service.
    pub fn new(
        backend: Arc<dyn BackendPort>,
        content_cache: Arc<dyn ContentCacheRepository>,
        pending_progress: Arc<dyn PendingProgressRepository>,
        flush_scheduler: Arc<dyn FlushSchedulerPort>,
    ) -> Self {
        Self {
            backend,
            content_cache,
            pending_progress,
            flush_scheduler,
            progress_source: None,
        }
    }

    /// Label progress posts with a source tag (e.g. `"mobile"`).
    #[must_use]
    pub fn with_progress_source(mut self, source: impl Into<String>) -> Self {
        self.progress_source = Some(source.into());
        self
    }

    /// Fetch the playback queue and prefetch the first `prefetch_count`
    /// item texts into the cache. Prefetch failures are logged and skipped;
    /// only the queue fetch itself can fail.
    pub async fn load_queue_and_prefetch(
        &self,
        prefetch_count: u32,
    ) -> Result<Vec<QueueItem>, PlaybackError> {
        let queue = self.backend.fetch_queue().await?;
        let take = prefetch_count.clamp(1, MAX_PREFETCH_COUNT) as usize;
        for item in queue.iter().take(take) {
            match self.backend.fetch_item_text(item.item_id).await {
                Ok(payload) => {
                    if let Err(error) = self.cache_item(&payload).await {
                        tracing::warn!(item_id = item.item_id, %error, "prefetch cache write failed");
                    }
                }
                Err(error) => {
                    tracing::debug!(item_id = item.item_id, %error, "prefetch skipped");
                }
            }
        }
        Ok(queue)
    }

    /// Fetch an item's text, falling back to the cache when the network
    /// fails.
    ///
    /// The fallback is refused with [`PlaybackError::StaleCache`] when the
    /// caller expects a specific content version and the cached copy carries
    /// a different one.
    pub async fn item_text(
        &self,
        item_id: i64,
        expected_version: Option<i64>,
    ) -> Result<ItemTextResult, PlaybackError> {
        match self.backend.fetch_item_text(item_id).await {
            Ok(payload) => {
                self.cache_item(&payload).await?;
                Ok(ItemTextResult {
                    payload,
                    using_cache: false,
                })
            }
            Err(error) => {
                let Some(cached) = self.content_cache.find_by_item_id(item_id).await? else {
                    return Err(error.into());
                };
                if let Some(expected) = expected_version
                    && cached.active_content_version_id != Some(expected)
                {
                    return Err(PlaybackError::StaleCache { item_id });
                }
                tracing::info!(item_id, "serving cached item text after fetch failure");
                Ok(ItemTextResult {
                    payload: cached.to_item_text(),
                    using_cache: true,
                })
            }
        }
    }

    /// Post progress for an item, queuing on transport failure.
    ///
    /// Terminal failures (authorization, HTTP errors) are never queued;
    /// they propagate.
    pub async fn post_progress(
        &self,
        item_id: i64,
        percent: i32,
    ) -> Result<ProgressPost, PlaybackError> {
        let clamped = percent.clamp(0, 100);
        match self
            .backend
            .post_progress(item_id, clamped, self.progress_source.as_deref())
            .await
        {
            Ok(()) => Ok(ProgressPost { queued: false }),
            Err(error) if error.is_retryable() => {
                tracing::debug!(item_id, percent = clamped, %error, "queueing progress for retry");
                self.pending_progress
                    .upsert(&NewPendingProgress {
                        item_id,
                        percent: clamped,
                        created_at: now_ms(),
                    })
                    .await?;
                self.flush_scheduler.request_flush();
                Ok(ProgressPost { queued: true })
            }
            Err(error) => Err(error.into()),
        }
    }

    /// One flush pass over the outbox.
    ///
    /// Entries at the attempt cap are skipped untouched; they stop counting
    /// as work but stay visible in `pending_count` until fresher progress
    /// for the same item replaces them.
    pub async fn flush_pending(&self) -> Result<FlushOutcome, PlaybackError> {
        let pending = self.pending_progress.list_pending().await?;
        let mut flushed_count = 0;
        let mut retryable_failures = 0;

        for entry in pending {
            if entry.attempt_count >= MAX_FLUSH_ATTEMPTS {
                continue;
            }
            match self
                .backend
                .post_progress(
                    entry.item_id,
                    entry.percent.clamp(0, 100),
                    self.progress_source.as_deref(),
                )
                .await
            {
                Ok(()) => {
                    self.pending_progress.delete_by_id(entry.id).await?;
                    flushed_count += 1;
                }
                Err(error) => {
                    if error.is_retryable() {
                        retryable_failures += 1;
                    }
                    self.pending_progress
                        .record_attempt(
                            entry.id,
                            entry.attempt_count + 1,
                            now_ms(),
                            truncate_error(&error.to_string()).as_deref(),
                        )
                        .await?;
                }
            }
        }

        let pending_count = self.pending_progress.count_pending().await?;
        let outcome = FlushOutcome {
            flushed_count,
            retryable_failures,
            pending_count,
        };
        tracing::debug!(
            flushed = outcome.flushed_count,
            retryable = outcome.retryable_failures,
            pending = outcome.pending_count,
            "flush pass finished"
        );
        Ok(outcome)
    }

    /// Number of queued progress updates.
    pub async fn count_pending(&self) -> Result<i64, PlaybackError> {
        Ok(self.pending_progress.count_pending().await?)
    }

    /// Which of the given item ids are readable offline.
    pub async fn cached_item_ids(&self, item_ids: &[i64]) -> Result<Vec<i64>, PlaybackError> {
        Ok(self.content_cache.cached_ids(item_ids).await?)
    }

    async fn cache_item(&self, payload: &ItemText) -> Result<(), PlaybackError> {
        let paragraphs = payload.paragraphs.clone().unwrap_or_default();
        let paragraphs_json = serde_json::to_string(&paragraphs)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.content_cache
            .upsert(&CachedItem {
                item_id: payload.item_id,
                active_content_version_id: payload.active_content_version_id,
                title: payload.title.clone(),
                url: payload.url.clone(),
                host: payload.host.clone(),
                status: payload.status.clone(),
                word_count: payload.word_count,
                text: payload.text.clone(),
                paragraphs_json,
                cached_at: now_ms(),
            })
            .await?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn truncate_error(message: &str) -> Option<String> {
    let clean = message.trim();
    if clean.is_empty() {
        return None;
    }
    Some(clean.chars().take(MAX_ERROR_CHARS).collect())
}
