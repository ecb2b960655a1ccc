//! Composition utilities for wiring `SQLite` backends.
//!
//! This module provides factory functions for building the repository set
//! consumed by `lectio-core` services. It is focused purely on construction
//! and should not contain any domain logic.

use sqlx::SqlitePool;
use std::sync::Arc;

use lectio_core::ports::Repos;

use crate::repositories::{
    SqliteContentCacheRepository, SqliteNowPlayingRepository, SqlitePendingProgressRepository,
    SqliteSettingsRepository,
};

/// Factory for creating repository instances with `SQLite` backends.
///
/// This struct provides composition utilities only — no domain logic.
pub struct CoreFactory;

impl CoreFactory {
    /// Create a `SQLite` connection pool.
    ///
    /// # Arguments
    ///
    /// * `db_url` - `SQLite` connection URL (e.g., "sqlite:~/.lectio/lectio.db")
    pub async fn create_pool(db_url: &str) -> anyhow::Result<SqlitePool> {
        let pool = SqlitePool::connect(db_url).await?;
        Ok(pool)
    }

    /// Build all `SQLite` repositories from a pool.
    ///
    /// This is the recommended way for adapters to obtain repositories.
    /// Returns a `Repos` struct from `lectio-core` containing
    /// trait-object-wrapped repositories.
    pub fn build_repos(pool: SqlitePool) -> Repos {
        Repos::new(
            Arc::new(SqliteContentCacheRepository::new(pool.clone())),
            Arc::new(SqlitePendingProgressRepository::new(pool.clone())),
            Arc::new(SqliteNowPlayingRepository::new(pool.clone())),
            Arc::new(SqliteSettingsRepository::new(pool)),
        )
    }

    /// Create a content cache repository from a pool.
    pub fn content_cache_repository(pool: SqlitePool) -> Arc<SqliteContentCacheRepository> {
        Arc::new(SqliteContentCacheRepository::new(pool))
    }

    /// Create a pending progress repository from a pool.
    pub fn pending_progress_repository(pool: SqlitePool) -> Arc<SqlitePendingProgressRepository> {
        Arc::new(SqlitePendingProgressRepository::new(pool))
    }

    /// Create a now playing repository from a pool.
    pub fn now_playing_repository(pool: SqlitePool) -> Arc<SqliteNowPlayingRepository> {
        Arc::new(SqliteNowPlayingRepository::new(pool))
    }

    /// Create a settings repository from a pool.
    pub fn settings_repository(pool: SqlitePool) -> Arc<SqliteSettingsRepository> {
        Arc::new(SqliteSettingsRepository::new(pool))
    }
}
