//! Item content and queue read-models.

use serde::{Deserialize, Serialize};

use super::chunk::PlaybackChunk;

/// Full text payload for a single item, as consumed by the playback engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemText {
    pub item_id: i64,
    pub title: Option<String>,
    pub url: String,
    pub host: Option<String>,
    pub status: Option<String>,
    pub active_content_version_id: Option<i64>,
    pub strategy_used: Option<String>,
    pub word_count: Option<i64>,
    pub text: String,
    pub paragraphs: Option<Vec<String>>,
    /// Pre-chunked ranges when the backend provides them.
    pub chunks: Option<Vec<PlaybackChunk>>,
    /// Declared canonical text length; chunk ranges may exceed it.
    pub total_chars: Option<i32>,
}

/// One entry of the server-side playback queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub item_id: i64,
    pub title: Option<String>,
    pub url: String,
    pub host: Option<String>,
    pub status: Option<String>,
    pub active_content_version_id: Option<i64>,
    pub strategy_used: Option<String>,
    pub word_count: Option<i64>,
    /// Resume position percent, never ahead of `furthest_percent`.
    pub progress_percent: Option<i32>,
    /// High-water progress mark recorded by the backend.
    pub furthest_percent: Option<i32>,
    pub last_opened_at: Option<String>,
    pub created_at: Option<String>,
}

/// Locally cached copy of an item's text, used as a read fallback when the
/// network fetch fails. One row per item id, last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedItem {
    pub item_id: i64,
    pub active_content_version_id: Option<i64>,
    pub title: Option<String>,
    pub url: String,
    pub host: Option<String>,
    pub status: Option<String>,
    pub word_count: Option<i64>,
    pub text: String,
    /// Paragraph list serialized as a JSON array of strings.
    pub paragraphs_json: String,
    pub cached_at: i64,
}

impl CachedItem {
    /// Rehydrates the cached row into an [`ItemText`] payload.
    ///
    /// A malformed paragraph blob degrades to no paragraphs rather than
    /// failing the offline read.
    #[must_use]
    pub fn to_item_text(&self) -> ItemText {
        let paragraphs: Vec<String> =
            serde_json::from_str(&self.paragraphs_json).unwrap_or_default();
        ItemText {
            item_id: self.item_id,
            title: self.title.clone(),
            url: self.url.clone(),
            host: self.host.clone(),
            status: self.status.clone(),
            active_content_version_id: self.active_content_version_id,
            strategy_used: None,
            word_count: self.word_count,
            text: self.text.clone(),
            paragraphs: Some(paragraphs),
            chunks: None,
            total_chars: None,
        }
    }
}

/// Sync state surfaced next to the progress display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncBadgeState {
    #[default]
    Synced,
    Queued,
    Offline,
}

impl SyncBadgeState {
    /// Convert state to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::Queued => "queued",
            Self::Offline => "offline",
        }
    }
}
