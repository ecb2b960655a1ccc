//! Core domain types, ports, and services for the lectio playback engine.
//!
//! This crate is infrastructure-free: persistence lives behind repository
//! ports (implemented by `lectio-db`) and the backend behind `BackendPort`
//! (implemented by `lectio-api`). The platform speech engine is abstracted
//! by `SpeechEnginePort`; the `SpeechDriver` turns its raw callback stream
//! into correlated chunk events.

pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    CachedItem, DONE_PERCENT_THRESHOLD, DoneTransition, FlushOutcome, ItemText,
    MAX_FLUSH_ATTEMPTS, NewPendingProgress, NowPlayingSession, PendingProgress, PlaybackChunk,
    PlaybackDoneEvent, PlaybackPosition, QueueItem, SessionItem, SyncBadgeState,
    absolute_char_offset, apply_done_transition, build_chunks, canonical_percent,
    position_for_percent, position_from_absolute_offset, should_force_near_end_commit,
    total_chars_for_percent,
};
pub use ports::{
    BackendError, BackendPort, ContentCacheRepository, FlushSchedulerPort, NoopFlushScheduler,
    NowPlayingRepository, NowPlayingRow, PendingProgressRepository, Repos, RepositoryError,
    SettingsRepository, SpeechEnginePort,
};
pub use services::{
    ItemTextResult, NowPlayingService, PlaybackError, PlaybackService, ProgressPost,
    ProgressSyncCoordinator, SessionError, SessionLoad, SpeechDriver, SpeechEvent, SyncError,
};
pub use settings::{Settings, SettingsError, validate_settings};

// Silence unused dev-dependency warnings until we add mock-based tests
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
