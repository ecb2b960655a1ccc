//! Now Playing session repository trait definition.
//!
//! At most one session row exists at a time. The row stores the item list as
//! an opaque JSON payload; parsing and all session semantics live in the
//! `NowPlayingService`, which also handles a payload that no longer parses.

use async_trait::async_trait;

use super::RepositoryError;

/// The single persisted session row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingRow {
    /// Serialized session item list (JSON array).
    pub queue_json: String,
    pub current_index: i32,
    pub updated_at: i64,
}

/// Repository for the single Now Playing session row.
#[async_trait]
pub trait NowPlayingRepository: Send + Sync {
    /// Insert or replace the session row.
    async fn upsert(&self, row: &NowPlayingRow) -> Result<(), RepositoryError>;

    /// Load the session row, if one exists.
    async fn load(&self) -> Result<Option<NowPlayingRow>, RepositoryError>;

    /// Update only the cursor of the existing row. No-op when no row exists.
    async fn set_current_index(
        &self,
        current_index: i32,
        updated_at: i64,
    ) -> Result<(), RepositoryError>;

    /// Delete the session row.
    async fn clear(&self) -> Result<(), RepositoryError>;
}
