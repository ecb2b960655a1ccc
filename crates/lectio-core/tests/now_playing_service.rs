//! Now Playing session service tests.
//!
//! These run against the real in-memory database via `lectio-db`. They live
//! as integration tests (not `#[cfg(test)]` units inside `lectio-core`)
//! because `lectio-db` depends on `lectio-core`; compiling them inside the
//! crate-under-test would link two distinct copies of `lectio-core` and the
//! repository types would fail to unify.

use std::sync::Arc;

use lectio_core::domain::QueueItem;
use lectio_core::ports::{NowPlayingRepository, NowPlayingRow};
use lectio_core::services::{NowPlayingService, SessionError};

use lectio_db::CoreFactory;
use lectio_db::setup::setup_test_database;

fn queue_item(item_id: i64) -> QueueItem {
    QueueItem {
        item_id,
        title: Some(format!("Item {item_id}")),
        url: format!("https://example.com/{item_id}"),
        host: None,
        status: None,
        active_content_version_id: None,
        strategy_used: None,
        word_count: None,
        progress_percent: None,
        furthest_percent: None,
        last_opened_at: None,
        created_at: None,
    }
}

async fn service() -> (NowPlayingService, Arc<dyn NowPlayingRepository>) {
    let pool = setup_test_database().await.unwrap();
    let repos = CoreFactory::build_repos(pool);
    (
        NowPlayingService::new(repos.now_playing.clone()),
        repos.now_playing,
    )
}

#[tokio::test]
async fn test_start_session_rejects_empty_queue() {
    let (service, _repo) = service().await;
    let err = service.start_session(&[], 1).await.unwrap_err();
    assert!(matches!(err, SessionError::EmptyQueue));
}

#[tokio::test]
async fn test_start_session_points_cursor_at_start_item() {
    let (service, _repo) = service().await;
    let queue = [queue_item(10), queue_item(20), queue_item(30)];

    let session = service.start_session(&queue, 20).await.unwrap();
    assert_eq!(session.current_index, 1);
    assert_eq!(session.items.len(), 3);

    // Unknown start item falls back to the first entry.
    let session = service.start_session(&queue, 999).await.unwrap();
    assert_eq!(session.current_index, 0);
}

#[tokio::test]
async fn test_load_session_round_trips() {
    let (service, _repo) = service().await;
    let queue = [queue_item(10), queue_item(20)];
    let started = service.start_session(&queue, 20).await.unwrap();

    let loaded = service.load_session().await.unwrap();
    assert!(!loaded.was_corrupt);
    assert_eq!(loaded.session.unwrap(), started);
}

#[tokio::test]
async fn test_load_session_clears_malformed_payload() {
    let (service, repo) = service().await;
    repo.upsert(&NowPlayingRow {
        queue_json: "definitely not json".to_string(),
        current_index: 0,
        updated_at: 1,
    })
    .await
    .unwrap();

    let loaded = service.load_session().await.unwrap();
    assert!(loaded.was_corrupt);
    assert!(loaded.session.is_none());
    assert!(repo.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_session_treats_empty_item_list_as_corrupt() {
    let (service, repo) = service().await;
    repo.upsert(&NowPlayingRow {
        queue_json: "[]".to_string(),
        current_index: 0,
        updated_at: 1,
    })
    .await
    .unwrap();

    let loaded = service.load_session().await.unwrap();
    assert!(loaded.was_corrupt);
    assert!(loaded.session.is_none());
}

#[tokio::test]
async fn test_load_session_clamps_stale_cursor() {
    let (service, repo) = service().await;
    let session = service
        .start_session(&[queue_item(10), queue_item(20)], 10)
        .await
        .unwrap();
    // Simulate a stale persisted cursor pointing past the end.
    repo.set_current_index(17, session.updated_at).await.unwrap();

    let loaded = service.load_session().await.unwrap().session.unwrap();
    assert_eq!(loaded.current_index, 1);
}

#[tokio::test]
async fn test_restart_session_resets_positions_and_cursor() {
    let (service, _repo) = service().await;
    service
        .start_session(&[queue_item(10), queue_item(20)], 20)
        .await
        .unwrap();
    service.set_position(20, 3, 41).await.unwrap();

    let restarted = service.restart_session().await.unwrap().unwrap();
    assert_eq!(restarted.current_index, 0);
    for item in &restarted.items {
        assert_eq!(item.chunk_index, 0);
        assert_eq!(item.offset_in_chunk_chars, 0);
    }
}

#[tokio::test]
async fn test_restart_without_session_returns_none() {
    let (service, _repo) = service().await;
    assert!(service.restart_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_set_position_touches_only_target_item() {
    let (service, _repo) = service().await;
    service
        .start_session(&[queue_item(10), queue_item(20)], 10)
        .await
        .unwrap();

    let session = service.set_position(20, 2, 15).await.unwrap().unwrap();
    assert_eq!(session.items[0].chunk_index, 0);
    assert_eq!(session.items[1].chunk_index, 2);
    assert_eq!(session.items[1].offset_in_chunk_chars, 15);
    assert_eq!(session.current_index, 0);

    // Unknown item leaves the session unmodified.
    let unchanged = service.set_position(999, 5, 5).await.unwrap().unwrap();
    assert_eq!(unchanged, session);
}

#[tokio::test]
async fn test_set_item_progress_never_regresses() {
    let (service, _repo) = service().await;
    service.start_session(&[queue_item(10)], 10).await.unwrap();

    let session = service.set_item_progress(10, 60).await.unwrap().unwrap();
    assert_eq!(session.items[0].last_read_percent, Some(60));

    let session = service.set_item_progress(10, 40).await.unwrap().unwrap();
    assert_eq!(session.items[0].last_read_percent, Some(60));

    let session = service.set_item_progress(10, 950).await.unwrap().unwrap();
    assert_eq!(session.items[0].last_read_percent, Some(100));
}

#[tokio::test]
async fn test_set_current_index_clamps() {
    let (service, _repo) = service().await;
    service
        .start_session(&[queue_item(10), queue_item(20)], 10)
        .await
        .unwrap();

    let session = service.set_current_index(40).await.unwrap().unwrap();
    assert_eq!(session.current_index, 1);
    let session = service.set_current_index(-3).await.unwrap().unwrap();
    assert_eq!(session.current_index, 0);
}

#[tokio::test]
async fn test_navigation_steps_and_stops_at_bounds() {
    let (service, _repo) = service().await;
    service
        .start_session(&[queue_item(10), queue_item(20), queue_item(30)], 10)
        .await
        .unwrap();

    assert_eq!(service.next_item(10).await.unwrap(), Some(20));
    assert_eq!(service.next_item(20).await.unwrap(), Some(30));
    assert_eq!(service.next_item(30).await.unwrap(), None);
    assert_eq!(service.prev_item(30).await.unwrap(), Some(20));
    assert_eq!(service.prev_item(10).await.unwrap(), None);

    // Navigation persists the cursor.
    service.next_item(10).await.unwrap();
    let loaded = service.load_session().await.unwrap().session.unwrap();
    assert_eq!(loaded.current_index, 1);
}

#[tokio::test]
async fn test_clear_removes_session() {
    let (service, _repo) = service().await;
    service.start_session(&[queue_item(10)], 10).await.unwrap();
    service.clear().await.unwrap();
    assert!(service.load_session().await.unwrap().session.is_none());
}
