//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - Traits are minimal and CRUD-focused for repositories
//! - Backend failures are a closed tagged set, classified by the adapter

pub mod backend;
pub mod content_cache;
pub mod flush_scheduler;
pub mod now_playing;
pub mod pending_progress;
pub mod settings_repository;
pub mod speech_engine;

use std::sync::Arc;
use thiserror::Error;

pub use backend::{BackendError, BackendPort};
pub use content_cache::ContentCacheRepository;
pub use flush_scheduler::{FlushSchedulerPort, NoopFlushScheduler};
pub use now_playing::{NowPlayingRepository, NowPlayingRow};
pub use pending_progress::PendingProgressRepository;
pub use settings_repository::SettingsRepository;
pub use speech_engine::SpeechEnginePort;

/// Container for all repository trait objects.
///
/// Provides a consistent way to wire repositories across adapters without
/// coupling them to concrete implementations. It lives in `lectio-core` so
/// services can accept it without depending on `lectio-db`.
#[derive(Clone)]
pub struct Repos {
    /// Cached item text for offline reads.
    pub content_cache: Arc<dyn ContentCacheRepository>,
    /// Durable progress outbox.
    pub pending_progress: Arc<dyn PendingProgressRepository>,
    /// The single Now Playing session row.
    pub now_playing: Arc<dyn NowPlayingRepository>,
    /// Application settings.
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repos {
    /// Create a new Repos container.
    pub fn new(
        content_cache: Arc<dyn ContentCacheRepository>,
        pending_progress: Arc<dyn PendingProgressRepository>,
        now_playing: Arc<dyn NowPlayingRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            content_cache,
            pending_progress,
            now_playing,
            settings,
        }
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx
/// errors) and provides a clean interface for services to handle storage
/// failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
