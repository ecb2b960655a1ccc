//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (database, network, speech engine).
//!
//! # Structure
//!
//! - `chunk` - Chunk/position math and the fallback chunk builder
//! - `content` - Item text, queue, and cache read-models
//! - `session` - Now Playing session types
//! - `pending` - Pending progress outbox types
//! - `transition` - Pure playback transition decisions

pub mod chunk;
pub mod content;
pub mod pending;
pub mod session;
pub mod transition;

// Re-export the frequently used types at the domain level for convenience
pub use chunk::{
    FALLBACK_CHUNK_MAX_CHARS, PlaybackChunk, PlaybackPosition, absolute_char_offset, build_chunks,
    canonical_percent, normalize_whitespace, position_for_percent, position_from_absolute_offset,
    total_chars_for_percent,
};
pub use content::{CachedItem, ItemText, QueueItem, SyncBadgeState};
pub use pending::{FlushOutcome, MAX_FLUSH_ATTEMPTS, NewPendingProgress, PendingProgress};
pub use session::{NowPlayingSession, SessionItem};
pub use transition::{
    DONE_PERCENT_THRESHOLD, DoneTransition, PlaybackDoneEvent, apply_done_transition,
    should_force_near_end_commit,
};
