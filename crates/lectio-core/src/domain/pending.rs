//! Pending progress outbox types.

use serde::{Deserialize, Serialize};

/// Attempts after which an entry is no longer retried by the flush pass.
/// Capped entries are skipped, not deleted; they disappear when fresher
/// progress for the same item replaces them.
pub const MAX_FLUSH_ATTEMPTS: i32 = 10;

/// A not-yet-acknowledged progress update, durably queued for retry.
///
/// Unique by `item_id`: enqueueing fresher progress for the same item
/// replaces the entry and resets its attempt count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingProgress {
    pub id: i64,
    pub item_id: i64,
    pub percent: i32,
    pub created_at: i64,
    pub attempt_count: i32,
    pub last_attempt_at: Option<i64>,
    pub last_error: Option<String>,
}

/// Fields for a new (or replacing) outbox entry.
#[derive(Debug, Clone)]
pub struct NewPendingProgress {
    pub item_id: i64,
    pub percent: i32,
    pub created_at: i64,
}

/// Result of one flush pass over the outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushOutcome {
    /// Entries delivered and deleted this pass.
    pub flushed_count: i32,
    /// Entries that failed with a retryable (transport) error.
    pub retryable_failures: i32,
    /// Entries still in the outbox after the pass.
    pub pending_count: i64,
}

impl FlushOutcome {
    /// Whether the caller should schedule another background flush.
    #[must_use]
    pub const fn should_reschedule(&self) -> bool {
        self.retryable_failures > 0 && self.pending_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reschedule_requires_retryable_and_pending() {
        let outcome = FlushOutcome {
            flushed_count: 1,
            retryable_failures: 2,
            pending_count: 2,
        };
        assert!(outcome.should_reschedule());

        let drained = FlushOutcome {
            flushed_count: 3,
            retryable_failures: 0,
            pending_count: 0,
        };
        assert!(!drained.should_reschedule());

        // Terminal-only failures keep entries pending but must not loop the
        // background job.
        let terminal_only = FlushOutcome {
            flushed_count: 0,
            retryable_failures: 0,
            pending_count: 4,
        };
        assert!(!terminal_only.should_reschedule());
    }
}
