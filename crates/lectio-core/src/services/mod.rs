//! Core services - orchestration logic over ports.
//!
//! Services contain the behavior of the playback engine; all infrastructure
//! access goes through the port traits so every service is testable against
//! in-memory fakes or the `lectio-db` test database.

pub mod now_playing;
pub mod playback;
pub mod speech_driver;
pub mod sync;

pub use now_playing::{NowPlayingService, SessionError, SessionLoad};
pub use playback::{ItemTextResult, PlaybackError, PlaybackService, ProgressPost};
pub use speech_driver::{CHUNK_DONE_SETTLE_DELAY, SpeechDriver, SpeechEvent};
pub use sync::{
    PROGRESS_CHAR_STEP, PROGRESS_SYNC_DEBOUNCE_MS, ProgressSyncCoordinator, SyncError, SyncGate,
};
