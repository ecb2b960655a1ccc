//! Wire DTOs for the backend API.
//!
//! The backend emits both current and legacy progress field names; decoding
//! keeps all of them and merges on conversion to domain types, preferring
//! the current names and clamping resume progress to the furthest mark.

use serde::{Deserialize, Serialize};

use lectio_core::domain::{ItemText, PlaybackChunk, QueueItem};

/// `GET /playback/queue` response.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueResponseDto {
    pub count: i64,
    pub items: Vec<QueueItemDto>,
}

/// One queue entry as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueItemDto {
    pub item_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active_content_version_id: Option<i64>,
    #[serde(default)]
    pub strategy_used: Option<String>,
    #[serde(default)]
    pub word_count: Option<i64>,
    #[serde(default)]
    pub progress_percent: Option<i32>,
    #[serde(default)]
    pub furthest_percent: Option<i32>,
    /// Legacy name for `progress_percent`.
    #[serde(default)]
    pub resume_read_percent: Option<i32>,
    /// Legacy name for `furthest_percent`.
    #[serde(default)]
    pub last_read_percent: Option<i32>,
    #[serde(default)]
    pub last_opened_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl QueueItemDto {
    /// Merged resume/furthest percents: current names win, legacy names fill
    /// in, and resume progress never exceeds the furthest mark.
    #[must_use]
    pub fn merged_progress(&self) -> (Option<i32>, Option<i32>) {
        let furthest = self.furthest_percent.or(self.last_read_percent);
        let progress = self.progress_percent.or(self.resume_read_percent);
        let progress = match (progress, furthest) {
            (Some(p), Some(f)) => Some(p.min(f)),
            (p, _) => p,
        };
        (progress, furthest)
    }

    /// Convert into the domain queue item.
    #[must_use]
    pub fn into_domain(self) -> QueueItem {
        let (progress_percent, furthest_percent) = self.merged_progress();
        QueueItem {
            item_id: self.item_id,
            title: self.title,
            url: self.url,
            host: self.host,
            status: self.status,
            active_content_version_id: self.active_content_version_id,
            strategy_used: self.strategy_used,
            word_count: self.word_count,
            progress_percent,
            furthest_percent,
            last_opened_at: self.last_opened_at,
            created_at: self.created_at,
        }
    }
}

/// A pre-chunked range as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkDto {
    pub index: i32,
    pub start_char: i32,
    pub end_char: i32,
    pub text: String,
}

/// `GET /items/{id}/text` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemTextDto {
    pub item_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active_content_version_id: Option<i64>,
    #[serde(default)]
    pub strategy_used: Option<String>,
    #[serde(default)]
    pub word_count: Option<i64>,
    pub text: String,
    #[serde(default)]
    pub paragraphs: Option<Vec<String>>,
    #[serde(default)]
    pub chunks: Option<Vec<ChunkDto>>,
    #[serde(default)]
    pub total_chars: Option<i32>,
}

impl ItemTextDto {
    /// Convert into the domain text payload.
    #[must_use]
    pub fn into_domain(self) -> ItemText {
        ItemText {
            item_id: self.item_id,
            title: self.title,
            url: self.url,
            host: self.host,
            status: self.status,
            active_content_version_id: self.active_content_version_id,
            strategy_used: self.strategy_used,
            word_count: self.word_count,
            text: self.text,
            paragraphs: self.paragraphs,
            chunks: self.chunks.map(|chunks| {
                chunks
                    .into_iter()
                    .map(|c| PlaybackChunk {
                        index: c.index,
                        start_char: c.start_char,
                        end_char: c.end_char,
                        text: c.text,
                    })
                    .collect()
            }),
            total_chars: self.total_chars,
        }
    }
}

/// `POST /items/{id}/progress` request body.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressPayload {
    pub percent: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
