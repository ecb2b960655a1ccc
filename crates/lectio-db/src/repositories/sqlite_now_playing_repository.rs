//! `SQLite` implementation of the `NowPlayingRepository` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;

use lectio_core::ports::{NowPlayingRepository, NowPlayingRow, RepositoryError};

/// Fixed primary key: at most one session row exists at a time.
const SESSION_ROW_ID: i64 = 1;

/// `SQLite` implementation of the `NowPlayingRepository` trait.
///
/// The payload is stored opaquely; parsing (and corrupt-payload recovery)
/// belongs to the session service.
pub struct SqliteNowPlayingRepository {
    pool: SqlitePool,
}

impl SqliteNowPlayingRepository {
    /// Create a new `SQLite` now playing repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NowPlayingRepository for SqliteNowPlayingRepository {
    async fn upsert(&self, row: &NowPlayingRow) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO now_playing (id, queue_json, current_index, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                queue_json = excluded.queue_json,
                current_index = excluded.current_index,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(SESSION_ROW_ID)
        .bind(&row.queue_json)
        .bind(row.current_index)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn load(&self) -> Result<Option<NowPlayingRow>, RepositoryError> {
        let row = sqlx::query(
            "SELECT queue_json, current_index, updated_at FROM now_playing WHERE id = ? LIMIT 1",
        )
        .bind(SESSION_ROW_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        use sqlx::Row;
        Ok(Some(NowPlayingRow {
            queue_json: row
                .try_get("queue_json")
                .map_err(|e| RepositoryError::Storage(format!("Column read error: {e}")))?,
            current_index: row
                .try_get("current_index")
                .map_err(|e| RepositoryError::Storage(format!("Column read error: {e}")))?,
            updated_at: row
                .try_get("updated_at")
                .map_err(|e| RepositoryError::Storage(format!("Column read error: {e}")))?,
        }))
    }

    async fn set_current_index(
        &self,
        current_index: i32,
        updated_at: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE now_playing SET current_index = ?, updated_at = ? WHERE id = ?")
            .bind(current_index)
            .bind(updated_at)
            .bind(SESSION_ROW_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM now_playing WHERE id = ?")
            .bind(SESSION_ROW_ID)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }
}
