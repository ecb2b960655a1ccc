//! Content cache repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::CachedItem;

/// Repository for locally cached item text.
///
/// One row per item id; `upsert` is last-write-wins. The cache is a read
/// fallback only — nothing in the core treats it as authoritative.
#[async_trait]
pub trait ContentCacheRepository: Send + Sync {
    /// Insert or replace the cached copy for an item.
    async fn upsert(&self, item: &CachedItem) -> Result<(), RepositoryError>;

    /// Look up the cached copy for an item.
    async fn find_by_item_id(&self, item_id: i64) -> Result<Option<CachedItem>, RepositoryError>;

    /// Which of the given ids have a cached copy.
    async fn cached_ids(&self, item_ids: &[i64]) -> Result<Vec<i64>, RepositoryError>;
}
