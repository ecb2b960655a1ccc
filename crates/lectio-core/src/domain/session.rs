//! Now Playing session types.
//!
//! The session is the persisted ordered playlist plus per-item resume
//! position. It survives process restarts; all index access is clamped so a
//! stale persisted `current_index` can never point outside the item list.

use serde::{Deserialize, Serialize};

use super::chunk::PlaybackPosition;
use super::content::QueueItem;

/// One item of the active playback playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionItem {
    pub item_id: i64,
    pub title: Option<String>,
    pub url: String,
    pub host: Option<String>,
    pub status: Option<String>,
    pub active_content_version_id: Option<i64>,
    pub last_read_percent: Option<i32>,
    pub chunk_index: i32,
    pub offset_in_chunk_chars: i32,
}

impl SessionItem {
    /// Snapshot a queue item into a session item starting at `{0,0}`.
    #[must_use]
    pub fn from_queue_item(item: &QueueItem) -> Self {
        Self {
            item_id: item.item_id,
            title: item.title.clone(),
            url: item.url.clone(),
            host: item.host.clone(),
            status: item.status.clone(),
            active_content_version_id: item.active_content_version_id,
            last_read_percent: item.furthest_percent,
            chunk_index: 0,
            offset_in_chunk_chars: 0,
        }
    }

    /// The item's resume position.
    #[must_use]
    pub const fn position(&self) -> PlaybackPosition {
        PlaybackPosition::new(self.chunk_index, self.offset_in_chunk_chars)
    }
}

/// The active playback session: ordered items plus the current cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingSession {
    pub items: Vec<SessionItem>,
    pub current_index: i32,
    pub updated_at: i64,
}

impl NowPlayingSession {
    /// Clamp an index into the item list bounds.
    #[must_use]
    pub fn clamp_index(&self, index: i32) -> i32 {
        if self.items.is_empty() {
            return 0;
        }
        index.clamp(0, (self.items.len() - 1) as i32)
    }

    /// The item the cursor points at. `None` only for an empty item list,
    /// which a well-formed session never has.
    #[must_use]
    pub fn current_item(&self) -> Option<&SessionItem> {
        self.items.get(self.clamp_index(self.current_index) as usize)
    }

    /// Position of `item_id` in the playlist.
    #[must_use]
    pub fn index_of(&self, item_id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.item_id == item_id)
    }

    /// Where navigation relative to `item_id` starts from: the item's own
    /// index when it is in the playlist, otherwise the clamped cursor.
    #[must_use]
    pub fn anchor_index(&self, item_id: i64) -> i32 {
        self.index_of(item_id)
            .map_or_else(|| self.clamp_index(self.current_index), |idx| idx as i32)
    }
}
