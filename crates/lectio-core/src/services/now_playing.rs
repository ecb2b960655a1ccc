//! Now Playing session service.
//!
//! Owns all session semantics over the single persisted row: snapshotting a
//! queue into a session, resume-position updates, navigation, and recovery
//! from a payload that no longer parses. Mutators are read-modify-write with
//! last-write-wins; there is no optimistic-concurrency guard.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{NowPlayingSession, QueueItem, SessionItem};
use crate::ports::{NowPlayingRepository, NowPlayingRow, RepositoryError};

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session cannot be started from an empty queue.
    #[error("Cannot start a session from an empty queue")]
    EmptyQueue,

    /// Local store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of loading the persisted session.
#[derive(Debug, Clone, Default)]
pub struct SessionLoad {
    pub session: Option<NowPlayingSession>,
    /// True when a persisted payload existed but was malformed and had to be
    /// cleared. The caller can surface a warning; nothing is thrown.
    pub was_corrupt: bool,
}

/// Service for the durable Now Playing session.
pub struct NowPlayingService {
    repo: Arc<dyn NowPlayingRepository>,
}

impl NowPlayingService {
    /// Create a new session service.
    pub fn new(repo: Arc<dyn NowPlayingRepository>) -> Self {
        Self { repo }
    }

    /// Snapshot a loaded queue into a fresh session and persist it.
    ///
    /// Every item starts at position `{0,0}`; the cursor points at
    /// `start_item_id` when present, the first item otherwise.
    pub async fn start_session(
        &self,
        queue_items: &[QueueItem],
        start_item_id: i64,
    ) -> Result<NowPlayingSession, SessionError> {
        if queue_items.is_empty() {
            return Err(SessionError::EmptyQueue);
        }
        let items: Vec<SessionItem> = queue_items.iter().map(SessionItem::from_queue_item).collect();
        let current_index = items
            .iter()
            .position(|item| item.item_id == start_item_id)
            .unwrap_or(0) as i32;
        let session = NowPlayingSession {
            items,
            current_index,
            updated_at: now_ms(),
        };
        self.persist(&session).await?;
        Ok(session)
    }

    /// Load the persisted session.
    ///
    /// A row whose payload fails to parse into a non-empty item list is
    /// cleared and reported via `was_corrupt` instead of an error.
    pub async fn load_session(&self) -> Result<SessionLoad, SessionError> {
        let Some(row) = self.repo.load().await? else {
            return Ok(SessionLoad::default());
        };
        let items: Vec<SessionItem> = match serde_json::from_str(&row.queue_json) {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!(%error, "clearing unreadable now-playing payload");
                self.repo.clear().await?;
                return Ok(SessionLoad {
                    session: None,
                    was_corrupt: true,
                });
            }
        };
        if items.is_empty() {
            tracing::warn!("clearing empty now-playing payload");
            self.repo.clear().await?;
            return Ok(SessionLoad {
                session: None,
                was_corrupt: true,
            });
        }
        let mut session = NowPlayingSession {
            items,
            current_index: row.current_index,
            updated_at: row.updated_at,
        };
        session.current_index = session.clamp_index(session.current_index);
        Ok(SessionLoad {
            session: Some(session),
            was_corrupt: false,
        })
    }

    /// Reset every item to `{0,0}` and the cursor to the first item.
    /// Returns `None` when no session exists.
    pub async fn restart_session(&self) -> Result<Option<NowPlayingSession>, SessionError> {
        let Some(mut session) = self.load_session().await?.session else {
            return Ok(None);
        };
        for item in &mut session.items {
            item.chunk_index = 0;
            item.offset_in_chunk_chars = 0;
        }
        session.current_index = 0;
        session.updated_at = now_ms();
        self.persist(&session).await?;
        Ok(Some(session))
    }

    /// Move the cursor, clamped into bounds.
    pub async fn set_current_index(
        &self,
        index: i32,
    ) -> Result<Option<NowPlayingSession>, SessionError> {
        let Some(mut session) = self.load_session().await?.session else {
            return Ok(None);
        };
        session.current_index = session.clamp_index(index);
        session.updated_at = now_ms();
        self.repo
            .set_current_index(session.current_index, session.updated_at)
            .await?;
        Ok(Some(session))
    }

    /// Update one item's resume position; other items and the cursor are
    /// untouched. An unknown item id returns the session unmodified.
    pub async fn set_position(
        &self,
        item_id: i64,
        chunk_index: i32,
        offset_in_chunk_chars: i32,
    ) -> Result<Option<NowPlayingSession>, SessionError> {
        let Some(mut session) = self.load_session().await?.session else {
            return Ok(None);
        };
        let Some(index) = session.index_of(item_id) else {
            return Ok(Some(session));
        };
        session.items[index].chunk_index = chunk_index;
        session.items[index].offset_in_chunk_chars = offset_in_chunk_chars;
        session.updated_at = now_ms();
        self.persist(&session).await?;
        Ok(Some(session))
    }

    /// Raise one item's recorded percent. Local progress never regresses:
    /// the stored value is the max of the existing and the new percent.
    pub async fn set_item_progress(
        &self,
        item_id: i64,
        percent: i32,
    ) -> Result<Option<NowPlayingSession>, SessionError> {
        let Some(mut session) = self.load_session().await?.session else {
            return Ok(None);
        };
        let Some(index) = session.index_of(item_id) else {
            return Ok(Some(session));
        };
        let clamped = percent.clamp(0, 100);
        let existing = session.items[index].last_read_percent.unwrap_or(0);
        session.items[index].last_read_percent = Some(existing.max(clamped));
        session.updated_at = now_ms();
        self.persist(&session).await?;
        Ok(Some(session))
    }

    /// Item id one step after `current_id`, advancing the cursor.
    /// `None` at the end of the playlist or without a session.
    pub async fn next_item(&self, current_id: i64) -> Result<Option<i64>, SessionError> {
        self.step_item(current_id, 1).await
    }

    /// Item id one step before `current_id`, moving the cursor back.
    /// `None` at the start of the playlist or without a session.
    pub async fn prev_item(&self, current_id: i64) -> Result<Option<i64>, SessionError> {
        self.step_item(current_id, -1).await
    }

    /// Delete the persisted session entirely.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.repo.clear().await?;
        Ok(())
    }

    async fn step_item(&self, current_id: i64, step: i32) -> Result<Option<i64>, SessionError> {
        let Some(session) = self.load_session().await?.session else {
            return Ok(None);
        };
        let target = session.anchor_index(current_id) + step;
        if target < 0 || target as usize >= session.items.len() {
            return Ok(None);
        }
        self.repo.set_current_index(target, now_ms()).await?;
        Ok(Some(session.items[target as usize].item_id))
    }

    async fn persist(&self, session: &NowPlayingSession) -> Result<(), SessionError> {
        let queue_json = serde_json::to_string(&session.items)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.repo
            .upsert(&NowPlayingRow {
                queue_json,
                current_index: session.current_index,
                updated_at: session.updated_at,
            })
            .await?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

