//! `SQLite` repository implementations.
//!
//! Each repository implements a port trait from `lectio-core`; no `sqlx`
//! types cross the crate boundary.

mod sqlite_content_cache_repository;
mod sqlite_now_playing_repository;
mod sqlite_pending_progress_repository;
mod sqlite_settings_repository;

pub use sqlite_content_cache_repository::SqliteContentCacheRepository;
pub use sqlite_now_playing_repository::SqliteNowPlayingRepository;
pub use sqlite_pending_progress_repository::SqlitePendingProgressRepository;
pub use sqlite_settings_repository::SqliteSettingsRepository;
