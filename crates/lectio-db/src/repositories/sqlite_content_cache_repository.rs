//! `SQLite` implementation of the `ContentCacheRepository` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;

use lectio_core::domain::CachedItem;
use lectio_core::ports::{ContentCacheRepository, RepositoryError};

/// `SQLite` implementation of the `ContentCacheRepository` trait.
///
/// One row per item id; upserts are last-write-wins.
pub struct SqliteContentCacheRepository {
    pool: SqlitePool,
}

impl SqliteContentCacheRepository {
    /// Create a new `SQLite` content cache repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentCacheRepository for SqliteContentCacheRepository {
    async fn upsert(&self, item: &CachedItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO cached_items (
                item_id, active_content_version_id, title, url, host,
                status, word_count, text, paragraphs_json, cached_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(item_id) DO UPDATE SET
                active_content_version_id = excluded.active_content_version_id,
                title = excluded.title,
                url = excluded.url,
                host = excluded.host,
                status = excluded.status,
                word_count = excluded.word_count,
                text = excluded.text,
                paragraphs_json = excluded.paragraphs_json,
                cached_at = excluded.cached_at
            "#,
        )
        .bind(item.item_id)
        .bind(item.active_content_version_id)
        .bind(&item.title)
        .bind(&item.url)
        .bind(&item.host)
        .bind(&item.status)
        .bind(item.word_count)
        .bind(&item.text)
        .bind(&item.paragraphs_json)
        .bind(item.cached_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn find_by_item_id(&self, item_id: i64) -> Result<Option<CachedItem>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT item_id, active_content_version_id, title, url, host,
                   status, word_count, text, paragraphs_json, cached_at
            FROM cached_items
            WHERE item_id = ?
            LIMIT 1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        row.as_ref().map(row_to_cached_item).transpose()
    }

    async fn cached_ids(&self, item_ids: &[i64]) -> Result<Vec<i64>, RepositoryError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; item_ids.len()].join(", ");
        let sql =
            format!("SELECT item_id FROM cached_items WHERE item_id IN ({placeholders}) ORDER BY item_id");
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in item_ids {
            query = query.bind(*id);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))
    }
}

/// Convert a database row to a `CachedItem`.
fn row_to_cached_item(row: &sqlx::sqlite::SqliteRow) -> Result<CachedItem, RepositoryError> {
    use sqlx::Row;

    Ok(CachedItem {
        item_id: row.try_get("item_id").map_err(map_column_error)?,
        active_content_version_id: row
            .try_get("active_content_version_id")
            .map_err(map_column_error)?,
        title: row.try_get("title").map_err(map_column_error)?,
        url: row.try_get("url").map_err(map_column_error)?,
        host: row.try_get("host").map_err(map_column_error)?,
        status: row.try_get("status").map_err(map_column_error)?,
        word_count: row.try_get("word_count").map_err(map_column_error)?,
        text: row.try_get("text").map_err(map_column_error)?,
        paragraphs_json: row.try_get("paragraphs_json").map_err(map_column_error)?,
        cached_at: row.try_get("cached_at").map_err(map_column_error)?,
    })
}

fn map_column_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(format!("Column read error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    fn cached_item(item_id: i64, version: Option<i64>) -> CachedItem {
        CachedItem {
            item_id,
            active_content_version_id: version,
            title: Some(format!("Item {item_id}")),
            url: format!("https://example.com/{item_id}"),
            host: Some("example.com".to_string()),
            status: Some("processed".to_string()),
            word_count: Some(120),
            text: "Body text".to_string(),
            paragraphs_json: r#"["Body text"]"#.to_string(),
            cached_at: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let pool = setup_test_database().await.unwrap();
        let repo = SqliteContentCacheRepository::new(pool);

        repo.upsert(&cached_item(7, Some(3))).await.unwrap();

        let found = repo.find_by_item_id(7).await.unwrap().unwrap();
        assert_eq!(found, cached_item(7, Some(3)));
        assert!(repo.find_by_item_id(8).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let pool = setup_test_database().await.unwrap();
        let repo = SqliteContentCacheRepository::new(pool);

        repo.upsert(&cached_item(7, Some(3))).await.unwrap();
        let mut updated = cached_item(7, Some(4));
        updated.text = "Re-processed body".to_string();
        repo.upsert(&updated).await.unwrap();

        let found = repo.find_by_item_id(7).await.unwrap().unwrap();
        assert_eq!(found.active_content_version_id, Some(4));
        assert_eq!(found.text, "Re-processed body");
    }

    #[tokio::test]
    async fn test_cached_ids_filters_to_known_items() {
        let pool = setup_test_database().await.unwrap();
        let repo = SqliteContentCacheRepository::new(pool);

        repo.upsert(&cached_item(1, None)).await.unwrap();
        repo.upsert(&cached_item(3, None)).await.unwrap();

        let ids = repo.cached_ids(&[1, 2, 3, 4]).await.unwrap();
        assert_eq!(ids, vec![1, 3]);
        assert!(repo.cached_ids(&[]).await.unwrap().is_empty());
    }
}
