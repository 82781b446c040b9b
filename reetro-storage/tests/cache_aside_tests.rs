//! Cache-aside protocol scenarios against instrumented doubles.

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use reetro_core::{Board, BoardPatch, EntityId, NewBoard, ReetroError, StorageError, UserProfile};
use reetro_storage::{AuthoritativeStore, CacheAside, CacheEffect, CacheLookup, CacheStoreExt};
use reetro_test_utils::fixtures::{actor_for, make_board, make_feedback, make_user};
use reetro_test_utils::generators::arb_new_board;
use reetro_test_utils::{CountingStore, Feedback, RecordingCache, Role};

fn setup() -> (CacheAside, RecordingCache, CountingStore) {
    let cache = RecordingCache::new();
    let store = CountingStore::new();
    (CacheAside::new(Arc::new(cache.clone())), cache, store)
}

async fn seeded_board(store: &CountingStore) -> Board {
    let admin = make_user("admin", Role::Admin);
    let board = make_board("Sprint 42", &actor_for(&admin));
    store.inner().board_insert(&board).await.unwrap();
    board
}

#[tokio::test]
async fn read_through_populates_cache_and_next_read_skips_store() {
    let (aside, cache, store) = setup();
    let board = seeded_board(&store).await;

    let first = aside.fetch_by_id::<Board, _>(board.id, &store).await.unwrap();
    assert_eq!(first.value(), &board);
    assert_eq!(first.lookup(), &CacheLookup::Miss);
    assert_eq!(first.effect(), &CacheEffect::Stored);
    assert_eq!(store.reads(), 1);
    assert!(cache.contains_key(&board.id.to_string()));

    let second = aside.fetch_by_id::<Board, _>(board.id, &store).await.unwrap();
    assert!(second.was_cache_hit());
    assert_eq!(second.into_value(), board);
    assert_eq!(store.reads(), 1, "a hit must not consult the store");
}

#[tokio::test]
async fn stale_cache_entry_wins_over_updated_store() {
    let (aside, cache, store) = setup();
    let board = seeded_board(&store).await;

    cache
        .backing()
        .set_json(&board.id.to_string(), &board)
        .await
        .unwrap();

    let mut updated = board.clone();
    updated.name = "Renamed behind the cache".to_string();
    store.inner().overwrite_board(updated).unwrap();

    let read = aside.fetch_by_id::<Board, _>(board.id, &store).await.unwrap();
    assert!(read.was_cache_hit());
    assert_eq!(read.value().name, "Sprint 42");
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn delete_removes_store_then_cache_and_later_read_is_not_found() {
    let (aside, cache, store) = setup();
    let board = seeded_board(&store).await;
    aside.fetch_by_id::<Board, _>(board.id, &store).await.unwrap();
    assert!(cache.contains_key(&board.id.to_string()));

    let deleted = aside
        .delete::<Board, _>(board.id, store.board_delete(board.id))
        .await
        .unwrap();
    assert_eq!(deleted.effect(), &CacheEffect::Invalidated);
    assert!(!cache.contains_key(&board.id.to_string()));

    let err = aside
        .fetch_by_id::<Board, _>(board.id, &store)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReetroError::Storage(StorageError::NotFound { .. })
    ));
    assert_eq!(store.reads(), 2);
}

#[tokio::test]
async fn failed_store_write_never_touches_cache() {
    let (aside, cache, store) = setup();
    let admin = make_user("admin", Role::Admin);
    let board = make_board("Doomed", &actor_for(&admin));
    store.set_fail_writes(true);

    let result = aside.write(store.board_insert(&board)).await;
    assert!(matches!(
        result,
        Err(ReetroError::Storage(StorageError::QueryFailed { .. }))
    ));
    assert_eq!(cache.total_calls(), 0);
}

#[tokio::test]
async fn failed_store_update_and_delete_never_touch_cache() {
    let (aside, cache, store) = setup();
    let board = seeded_board(&store).await;
    let admin = make_user("admin", Role::Admin);
    store.set_fail_writes(true);

    let patch = BoardPatch {
        name: Some("nope".to_string()),
        ..Default::default()
    };
    assert!(aside
        .write(store.board_update(board.id, patch, &actor_for(&admin)))
        .await
        .is_err());
    assert!(aside
        .delete::<Board, _>(board.id, store.board_delete(board.id))
        .await
        .is_err());
    assert_eq!(cache.total_calls(), 0);
}

#[tokio::test]
async fn cache_outage_does_not_fail_reads_or_writes() {
    let cache = RecordingCache::failing();
    let store = CountingStore::new();
    let aside = CacheAside::new(Arc::new(cache.clone()));
    let admin = make_user("admin", Role::Admin);
    let board = make_board("Resilient", &actor_for(&admin));

    let created = aside.write(store.board_insert(&board)).await.unwrap();
    assert!(created.effect().is_failure());

    let read = aside.fetch_by_id::<Board, _>(board.id, &store).await.unwrap();
    assert!(matches!(read.lookup(), CacheLookup::Failed(_)));
    assert!(read.effect().is_failure());
    assert_eq!(read.value(), &board);

    let deleted = aside
        .delete::<Board, _>(board.id, store.board_delete(board.id))
        .await
        .unwrap();
    assert!(deleted.effect().is_failure());
}

#[tokio::test]
async fn update_refreshes_cached_value() {
    let (aside, cache, store) = setup();
    let board = seeded_board(&store).await;
    let admin = make_user("admin", Role::Admin);
    aside.fetch_by_id::<Board, _>(board.id, &store).await.unwrap();

    let patch = BoardPatch {
        name: Some("Sprint 43".to_string()),
        ..Default::default()
    };
    aside
        .write(store.board_update(board.id, patch, &actor_for(&admin)))
        .await
        .unwrap();

    let cached: Option<Board> = cache
        .backing()
        .get_json(&board.id.to_string())
        .await
        .unwrap();
    assert_eq!(cached.map(|b| b.name), Some("Sprint 43".to_string()));
}

#[tokio::test]
async fn users_are_cached_without_password_hash() {
    let (aside, cache, store) = setup();
    let user = make_user("dana", Role::Member);
    store.inner().user_insert(&user).await.unwrap();

    let read = aside
        .fetch_by_id::<UserProfile, _>(user.id, &store)
        .await
        .unwrap();
    assert_eq!(read.value().username, "dana");

    let raw = cache
        .backing()
        .get_json::<serde_json::Value>(&user.id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert!(raw.get("password_hash").is_none());
}

#[tokio::test]
async fn feedback_follows_the_same_protocol() {
    let (aside, _cache, store) = setup();
    let board = seeded_board(&store).await;
    let author = make_user("eve", Role::Guest);
    let feedback = make_feedback("more demos", &board, &actor_for(&author));

    aside.write(store.feedback_insert(&feedback)).await.unwrap();
    let read = aside
        .fetch_by_id::<Feedback, _>(feedback.id, &store)
        .await
        .unwrap();
    assert!(read.was_cache_hit());
    assert_eq!(store.reads(), 0);
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

const SLOTS: usize = 4;

#[derive(Debug, Clone)]
enum BoardOp {
    Create(usize, NewBoard),
    Rename(usize, String),
    Delete(usize),
    Read(usize),
}

fn arb_op() -> impl Strategy<Value = BoardOp> {
    prop_oneof![
        (0..SLOTS, arb_new_board()).prop_map(|(slot, draft)| BoardOp::Create(slot, draft)),
        (0..SLOTS, "[a-z]{1,12}").prop_map(|(slot, name)| BoardOp::Rename(slot, name)),
        (0..SLOTS).prop_map(BoardOp::Delete),
        (0..SLOTS).prop_map(BoardOp::Read),
    ]
}

/// Applies `ops` through the coordinator and checks the cache against the
/// store after every step.
async fn run_board_ops(ops: Vec<BoardOp>) -> Result<(), TestCaseError> {
    let (aside, cache, store) = setup();
    let admin = make_user("admin", Role::Admin);
    let actor = actor_for(&admin);
    let mut live: [Option<EntityId>; SLOTS] = [None; SLOTS];
    let mut deleted: Vec<EntityId> = Vec::new();

    for op in ops {
        match op {
            BoardOp::Create(slot, draft) => {
                if live[slot].is_some() {
                    continue;
                }
                let board = Board::from_draft(draft, &actor, Utc::now());
                let written = aside.write(store.board_insert(&board)).await.unwrap();
                live[slot] = Some(written.value().id);
            }
            BoardOp::Rename(slot, name) => {
                let Some(id) = live[slot] else { continue };
                let patch = BoardPatch {
                    name: Some(name),
                    ..Default::default()
                };
                aside.write(store.board_update(id, patch, &actor)).await.unwrap();
            }
            BoardOp::Delete(slot) => {
                let Some(id) = live[slot].take() else { continue };
                aside
                    .delete::<Board, _>(id, store.board_delete(id))
                    .await
                    .unwrap();
                deleted.push(id);
            }
            BoardOp::Read(slot) => {
                let Some(id) = live[slot] else { continue };
                let read = aside.fetch_by_id::<Board, _>(id, &store).await.unwrap();
                prop_assert!(read.was_cache_hit());
            }
        }

        for id in live.iter().flatten() {
            let row = store.inner().board_get(*id).await.unwrap();
            let cached: Option<Board> = cache.backing().get_json(&id.to_string()).await.unwrap();
            prop_assert!(row.is_some());
            prop_assert_eq!(cached, row);
        }
        for id in &deleted {
            prop_assert!(!cache.contains_key(&id.to_string()));
        }
    }
    prop_assert_eq!(store.reads(), 0);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After any coordinated write sequence the cache mirrors the store and
    /// holds nothing for deleted ids.
    #[test]
    fn prop_coordinated_writes_keep_cache_in_step(ops in prop::collection::vec(arb_op(), 1..24)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(run_board_ops(ops))?;
    }
}
