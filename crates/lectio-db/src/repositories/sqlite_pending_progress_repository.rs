//! `SQLite` implementation of the `PendingProgressRepository` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;

use lectio_core::domain::{NewPendingProgress, PendingProgress};
use lectio_core::ports::{PendingProgressRepository, RepositoryError};

/// `SQLite` implementation of the `PendingProgressRepository` trait.
///
/// The unique index on `item_id` makes the upsert collapse repeated updates
/// for an item into one entry; the replacement resets attempt bookkeeping so
/// a previously failing entry becomes deliverable again with fresh progress.
pub struct SqlitePendingProgressRepository {
    pool: SqlitePool,
}

impl SqlitePendingProgressRepository {
    /// Create a new `SQLite` pending progress repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingProgressRepository for SqlitePendingProgressRepository {
    async fn upsert(&self, entry: &NewPendingProgress) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO pending_progress (
                item_id, percent, created_at, attempt_count, last_attempt_at, last_error
            ) VALUES (?, ?, ?, 0, NULL, NULL)
            ON CONFLICT(item_id) DO UPDATE SET
                percent = excluded.percent,
                created_at = excluded.created_at,
                attempt_count = 0,
                last_attempt_at = NULL,
                last_error = NULL
            "#,
        )
        .bind(entry.item_id)
        .bind(entry.percent)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<PendingProgress>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, percent, created_at, attempt_count, last_attempt_at, last_error
            FROM pending_progress
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_pending_progress).collect()
    }

    async fn count_pending(&self) -> Result<i64, RepositoryError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pending_progress")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))
    }

    async fn record_attempt(
        &self,
        id: i64,
        attempt_count: i32,
        last_attempt_at: i64,
        last_error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_progress
            SET attempt_count = ?, last_attempt_at = ?, last_error = ?
            WHERE id = ?
            "#,
        )
        .bind(attempt_count)
        .bind(last_attempt_at)
        .bind(last_error)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Pending progress entry with ID '{id}'"
            )));
        }

        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM pending_progress WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }
}

/// Convert a database row to a `PendingProgress`.
fn row_to_pending_progress(row: &sqlx::sqlite::SqliteRow) -> Result<PendingProgress, RepositoryError> {
    use sqlx::Row;

    Ok(PendingProgress {
        id: row.try_get("id").map_err(map_column_error)?,
        item_id: row.try_get("item_id").map_err(map_column_error)?,
        percent: row.try_get("percent").map_err(map_column_error)?,
        created_at: row.try_get("created_at").map_err(map_column_error)?,
        attempt_count: row.try_get("attempt_count").map_err(map_column_error)?,
        last_attempt_at: row.try_get("last_attempt_at").map_err(map_column_error)?,
        last_error: row.try_get("last_error").map_err(map_column_error)?,
    })
}

fn map_column_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(format!("Column read error: {e}"))
}
