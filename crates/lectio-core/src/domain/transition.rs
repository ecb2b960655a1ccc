//! Playback transition decisions.
//!
//! Pure functions reconciling a "chunk finished" event from the speech layer
//! with the current playback target. No side effects; the player applies the
//! returned decision.

use super::chunk::PlaybackPosition;

/// Percent at which an item counts as read to completion.
pub const DONE_PERCENT_THRESHOLD: i32 = 98;

/// A completed utterance, as correlated by the speech driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackDoneEvent {
    pub utterance_id: String,
    pub item_id: i64,
    pub chunk_index: i32,
}

/// Outcome of applying a done event to the current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneTransition {
    /// False when the event is a duplicate or stale and must be dropped.
    pub should_handle: bool,
    pub next_position: PlaybackPosition,
    pub should_play_next_chunk: bool,
    pub reached_end: bool,
    /// Utterance id to remember as handled after applying this transition.
    pub handled_utterance_id: Option<String>,
}

impl DoneTransition {
    fn ignored(position: PlaybackPosition, last_handled: Option<&str>) -> Self {
        Self {
            should_handle: false,
            next_position: position,
            should_play_next_chunk: false,
            reached_end: false,
            handled_utterance_id: last_handled.map(str::to_string),
        }
    }
}

/// Decides whether the first crossing of the completion threshold should
/// force an immediate `percent=100` commit.
///
/// Fires only on the crossing itself: once the previous observation is at or
/// above the threshold the commit has already happened.
#[must_use]
pub fn should_force_near_end_commit(
    previous_percent: i32,
    current_percent: i32,
    threshold_percent: i32,
) -> bool {
    if threshold_percent <= 0 {
        return true;
    }
    if current_percent < threshold_percent {
        return false;
    }
    previous_percent < threshold_percent
}

/// Reconciles a chunk-done event with the current playback target.
///
/// Duplicate events (same utterance id as the last handled one) and stale
/// events (different item, or a chunk other than the one currently playing)
/// are reported as not-to-handle with the position unchanged.
#[must_use]
pub fn apply_done_transition(
    event: Option<&PlaybackDoneEvent>,
    current_item_id: i64,
    current_position: PlaybackPosition,
    chunk_count: i32,
    last_handled_utterance_id: Option<&str>,
) -> DoneTransition {
    let Some(event) = event else {
        return DoneTransition::ignored(current_position, last_handled_utterance_id);
    };
    if chunk_count <= 0 {
        return DoneTransition::ignored(current_position, last_handled_utterance_id);
    }
    if Some(event.utterance_id.as_str()) == last_handled_utterance_id {
        return DoneTransition::ignored(current_position, last_handled_utterance_id);
    }
    if event.item_id != current_item_id || event.chunk_index != current_position.chunk_index {
        return DoneTransition::ignored(current_position, last_handled_utterance_id);
    }

    if current_position.chunk_index < chunk_count - 1 {
        return DoneTransition {
            should_handle: true,
            next_position: PlaybackPosition::new(current_position.chunk_index + 1, 0),
            should_play_next_chunk: true,
            reached_end: false,
            handled_utterance_id: Some(event.utterance_id.clone()),
        };
    }

    DoneTransition {
        should_handle: true,
        next_position: current_position,
        should_play_next_chunk: false,
        reached_end: true,
        handled_utterance_id: Some(event.utterance_id.clone()),
    }
}
