//! Progress sync coordinator.
//!
//! Decides when reading progress is worth sending, converts send failures
//! into queue entries (via the playback service), and force-commits 100% the
//! first time a reader crosses the completion threshold. Every attempted
//! post also updates the local session percent so the UI-visible state is
//! correct while a network send is outstanding.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::transition::DONE_PERCENT_THRESHOLD;
use crate::domain::{
    FlushOutcome, PlaybackChunk, PlaybackPosition, SyncBadgeState, absolute_char_offset,
    canonical_percent, should_force_near_end_commit,
};
use crate::services::now_playing::{NowPlayingService, SessionError};
use crate::services::playback::{PlaybackError, PlaybackService, ProgressPost};

/// Minimum interval between two non-forced progress sends.
pub const PROGRESS_SYNC_DEBOUNCE_MS: i64 = 2_000;

/// Absolute-offset advance that counts as enough progress to send.
pub const PROGRESS_CHAR_STEP: i32 = 120;

/// Errors surfaced by the coordinator.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Send-decision watermarks for one item.
///
/// Pure state: the decision depends only on the recorded watermarks and the
/// values passed in, so it is directly unit-testable.
#[derive(Debug, Clone)]
pub struct SyncGate {
    last_synced_percent: i32,
    last_synced_absolute_chars: i32,
    last_sync_at_ms: i64,
}

impl Default for SyncGate {
    fn default() -> Self {
        Self {
            last_synced_percent: -1,
            last_synced_absolute_chars: -1,
            last_sync_at_ms: 0,
        }
    }
}

impl SyncGate {
    /// Whether a send is due.
    ///
    /// `force` bypasses both the progress thresholds and the debounce.
    /// Otherwise progress must have accrued (percent increased, or the
    /// absolute offset advanced by [`PROGRESS_CHAR_STEP`]) and the debounce
    /// interval must have elapsed since the last send.
    #[must_use]
    pub fn should_send(&self, force: bool, now_ms: i64, percent: i32, absolute: i32) -> bool {
        if force {
            return true;
        }
        let advanced_percent = percent > self.last_synced_percent;
        let advanced_chars = absolute - self.last_synced_absolute_chars >= PROGRESS_CHAR_STEP;
        if !advanced_percent && !advanced_chars {
            return false;
        }
        now_ms - self.last_sync_at_ms >= PROGRESS_SYNC_DEBOUNCE_MS
    }

    fn record_send(&mut self, now_ms: i64, percent: i32, absolute: i32) {
        self.last_sync_at_ms = now_ms;
        self.last_synced_percent = percent;
        self.last_synced_absolute_chars = absolute;
    }
}

struct CoordinatorState {
    item_id: Option<i64>,
    gate: SyncGate,
    last_observed_percent: i32,
    near_end_forced_item_id: Option<i64>,
    badge: SyncBadgeState,
}

impl CoordinatorState {
    fn ensure_item(&mut self, item_id: i64) {
        if self.item_id != Some(item_id) {
            self.item_id = Some(item_id);
            self.gate = SyncGate::default();
            self.last_observed_percent = -1;
            self.near_end_forced_item_id = None;
        }
    }
}

/// Orchestrates progress delivery for the item currently playing.
pub struct ProgressSyncCoordinator {
    playback: Arc<PlaybackService>,
    session: Arc<NowPlayingService>,
    state: tokio::sync::Mutex<CoordinatorState>,
}

impl ProgressSyncCoordinator {
    /// Create a new coordinator.
    pub fn new(playback: Arc<PlaybackService>, session: Arc<NowPlayingService>) -> Self {
        Self {
            playback,
            session,
            state: tokio::sync::Mutex::new(CoordinatorState {
                item_id: None,
                gate: SyncGate::default(),
                last_observed_percent: -1,
                near_end_forced_item_id: None,
                badge: SyncBadgeState::Synced,
            }),
        }
    }

    /// Reset watermarks for a freshly loaded item.
    pub async fn begin_item(&self, item_id: i64) {
        let mut state = self.state.lock().await;
        state.item_id = Some(item_id);
        state.gate = SyncGate::default();
        state.last_observed_percent = -1;
        state.near_end_forced_item_id = None;
    }

    /// Current sync badge for display.
    pub async fn badge(&self) -> SyncBadgeState {
        self.state.lock().await.badge
    }

    /// Record that connectivity is known to be down.
    pub async fn mark_offline(&self) {
        self.state.lock().await.badge = SyncBadgeState::Offline;
    }

    /// Send progress for the current position if it is due.
    ///
    /// Returns `None` when nothing was sent (no chunks, or the gate held it
    /// back). A queued result means the update went to the outbox instead of
    /// the backend; terminal failures propagate.
    pub async fn maybe_sync(
        &self,
        item_id: i64,
        total_chars: i32,
        chunks: &[PlaybackChunk],
        position: PlaybackPosition,
        force: bool,
    ) -> Result<Option<ProgressPost>, SyncError> {
        if chunks.is_empty() {
            return Ok(None);
        }
        let now_ms = now_ms();
        let absolute = absolute_char_offset(total_chars, chunks, position);
        let percent = canonical_percent(total_chars, chunks, position);

        let mut state = self.state.lock().await;
        state.ensure_item(item_id);
        if !state.gate.should_send(force, now_ms, percent, absolute) {
            return Ok(None);
        }

        tracing::debug!(
            item_id,
            chunk = position.chunk_index,
            offset = position.offset_in_chunk_chars,
            percent,
            force,
            "syncing progress"
        );
        let result = self.playback.post_progress(item_id, percent).await;
        // Watermarks move on every attempt, not only on success.
        state.gate.record_send(now_ms, percent, absolute);
        let post = result?;
        state.badge = if post.queued {
            SyncBadgeState::Queued
        } else {
            SyncBadgeState::Synced
        };
        drop(state);

        self.session.set_item_progress(item_id, percent).await?;
        Ok(Some(post))
    }

    /// Feed a freshly recomputed percent into near-end detection.
    ///
    /// The first observation at or above the completion threshold forces a
    /// `percent=100` commit (once per item) and immediately flushes the
    /// outbox, so a reader who stops just shy of the literal end still lands
    /// on a recorded done state.
    pub async fn observe_percent(
        &self,
        item_id: i64,
        current_percent: i32,
    ) -> Result<Option<FlushOutcome>, SyncError> {
        let mut state = self.state.lock().await;
        state.ensure_item(item_id);
        let crossed = should_force_near_end_commit(
            state.last_observed_percent,
            current_percent,
            DONE_PERCENT_THRESHOLD,
        );
        state.last_observed_percent = current_percent;
        if !crossed || state.near_end_forced_item_id == Some(item_id) {
            return Ok(None);
        }
        // Guard before posting: even a failed force is not retried here.
        state.near_end_forced_item_id = Some(item_id);

        tracing::info!(
            item_id,
            percent = current_percent,
            threshold = DONE_PERCENT_THRESHOLD,
            "crossed near-end threshold, forcing completion"
        );
        let post = self.playback.post_progress(item_id, 100).await?;
        state.badge = if post.queued {
            SyncBadgeState::Queued
        } else {
            SyncBadgeState::Synced
        };
        drop(state);

        self.session.set_item_progress(item_id, 100).await?;
        let outcome = self.playback.flush_pending().await?;
        Ok(Some(outcome))
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
