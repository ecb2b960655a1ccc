//! Pending progress repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewPendingProgress, PendingProgress};

/// Repository for the durable progress outbox.
///
/// `upsert` is unique-by-item-id: a fresh entry for an item replaces the
/// previous one and resets its attempt bookkeeping, so the outbox holds at
/// most one outstanding update per item.
#[async_trait]
pub trait PendingProgressRepository: Send + Sync {
    /// Insert a new entry, replacing any existing entry for the same item.
    async fn upsert(&self, entry: &NewPendingProgress) -> Result<(), RepositoryError>;

    /// All entries ordered by `(created_at, id)`.
    async fn list_pending(&self) -> Result<Vec<PendingProgress>, RepositoryError>;

    /// Number of entries in the outbox.
    async fn count_pending(&self) -> Result<i64, RepositoryError>;

    /// Record the result of a delivery attempt.
    async fn record_attempt(
        &self,
        id: i64,
        attempt_count: i32,
        last_attempt_at: i64,
        last_error: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Delete a delivered entry.
    async fn delete_by_id(&self, id: i64) -> Result<(), RepositoryError>;
}
