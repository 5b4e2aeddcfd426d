//! End-to-end scenarios: coordinator over the JSON file store
//!
//! Every assertion about persisted state re-opens the list file, so these
//! tests see what a second process would see.

use std::sync::Arc;

use gear_order::{ListId, MoveIntent};
use gear_store::JsonFileStore;
use gear_sync::adapters::{DragHandle, DragRelease, DropTarget, ManualMove};
use gear_sync::{Coordinator, Error, MovePhase, Settings, WriteMode};
use gear_test_utils::{FlakyStore, LIST_ID, TestListFile, entry_ids};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn list() -> ListId {
    ListId::from(LIST_ID)
}

async fn open(file: &TestListFile, settings: &Settings) -> Coordinator<JsonFileStore> {
    Coordinator::load(Arc::new(file.store()), list(), settings)
        .await
        .unwrap()
}

fn transfer(entry: &str, from: &str, to: &str, to_index: usize) -> MoveIntent {
    MoveIntent::Transfer {
        entry_id: entry.into(),
        from_container_id: from.into(),
        to_container_id: to.into(),
        to_index,
    }
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[tokio::test]
async fn transfer_scenario_is_persisted() {
    let file = TestListFile::new(&[("a", "a0 a1 a2"), ("b", "b0")]);
    let coordinator = open(&file, &Settings::default()).await;

    let report = coordinator
        .plan_and_commit_move(transfer("a1", "a", "b", 1))
        .await
        .unwrap();

    assert_eq!(report.phase, MovePhase::Settled);
    assert_eq!(report.writes_issued, 2);
    let stored = file.state();
    assert_eq!(entry_ids(&stored, "a"), vec!["a0", "a2"]);
    assert_eq!(entry_ids(&stored, "b"), vec!["b0", "a1"]);
    assert_eq!(stored, coordinator.snapshot().await);
}

#[tokio::test]
async fn reorder_scenario_is_persisted() {
    let file = TestListFile::new(&[("x", "x0 x1 x2 x3")]);
    let coordinator = open(&file, &Settings::default()).await;

    let report = coordinator
        .plan_and_commit_move(MoveIntent::Reorder {
            container_id: "x".into(),
            entry_id: "x0".into(),
            from_index: 0,
            to_index: 2,
        })
        .await
        .unwrap();

    assert_eq!(report.writes_issued, 3);
    assert_eq!(entry_ids(&file.state(), "x"), vec!["x1", "x2", "x0", "x3"]);
}

#[rstest]
#[case::prepend(0, vec!["a0", "b0", "b1"])]
#[case::middle(1, vec!["b0", "a0", "b1"])]
#[case::append(2, vec!["b0", "b1", "a0"])]
#[case::past_the_end(9, vec!["b0", "b1", "a0"])]
#[tokio::test]
async fn insertion_bounds_hold_on_disk(#[case] to_index: usize, #[case] expected: Vec<&str>) {
    let file = TestListFile::new(&[("a", "a0 a1"), ("b", "b0 b1")]);
    let coordinator = open(&file, &Settings::default()).await;

    coordinator
        .plan_and_commit_move(transfer("a0", "a", "b", to_index))
        .await
        .unwrap();

    let stored = file.state();
    assert_eq!(entry_ids(&stored, "b"), expected);
    assert!(stored.is_valid(), "{:?}", stored.check_invariants());
}

// ============================================================================
// Failure handling
// ============================================================================

/// a1 moves from a(a0 a1 a2 a3) to b(b0 b1) at index 1: the moved entry,
/// then the two source siblings, then one destination sibling
#[rstest]
#[case::moved_entry(1)]
#[case::first_source_sibling(2)]
#[case::last_source_sibling(3)]
#[case::destination_sibling(4)]
#[tokio::test]
async fn rollback_matches_the_file_whichever_write_fails(#[case] failing: usize) {
    let file = TestListFile::new(&[("a", "a0 a1 a2 a3"), ("b", "b0 b1")]);
    let store = FlakyStore::new(file.store()).fail_on_write(failing);
    let coordinator = Coordinator::load(Arc::new(store), list(), &Settings::default())
        .await
        .unwrap();

    let err = coordinator
        .plan_and_commit_move(transfer("a1", "a", "b", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Persistence { reconciled: true, .. }));
    assert_eq!(coordinator.snapshot().await, file.state());
}

#[tokio::test]
async fn reindex_repairs_a_partially_written_move() {
    let file = TestListFile::new(&[("a", "a0 a1 a2 a3"), ("b", "b0 b1")]);
    let store = FlakyStore::new(file.store()).fail_on_write(2);
    let coordinator = Coordinator::load(Arc::new(store), list(), &Settings::default())
        .await
        .unwrap();
    coordinator
        .plan_and_commit_move(transfer("a1", "a", "b", 1))
        .await
        .unwrap_err();
    assert!(!file.state().is_valid());

    coordinator.reindex_all().await.unwrap();

    let stored = file.state();
    assert!(stored.is_valid(), "{:?}", stored.check_invariants());
    assert_eq!(stored, coordinator.snapshot().await);
}

// ============================================================================
// Settings and adapters
// ============================================================================

#[tokio::test]
async fn batched_writes_reach_the_file() {
    let file = TestListFile::new(&[("sleep", "quilt pad"), ("cook", "stove pot lighter")]);
    let settings = Settings::parse("[coordinator]\nwrite_mode = \"batched\"\n").unwrap();
    assert_eq!(settings.coordinator.write_mode, WriteMode::Batched);
    let coordinator = open(&file, &settings).await;

    let report = coordinator
        .plan_and_commit_move(transfer("stove", "cook", "sleep", 0))
        .await
        .unwrap();

    assert_eq!(report.writes_issued, 2);
    let stored = file.state();
    assert_eq!(entry_ids(&stored, "sleep"), vec!["stove", "quilt", "pad"]);
    assert_eq!(entry_ids(&stored, "cook"), vec!["pot", "lighter"]);
}

#[tokio::test]
async fn drag_and_manual_edits_survive_reopening() {
    let file = TestListFile::new(&[("sleep", "quilt pad pillow"), ("cook", "stove")]);
    {
        let coordinator = open(&file, &Settings::default()).await;
        coordinator
            .commit_drag(&DragRelease {
                active: DragHandle::Entry {
                    container_id: "sleep".into(),
                    entry_id: "pillow".into(),
                },
                over: Some(DropTarget::Container {
                    container_id: "cook".into(),
                }),
            })
            .await
            .unwrap();
        coordinator
            .commit_manual(&ManualMove {
                entry_id: "pad".into(),
                to_container_id: "sleep".into(),
                position: 1,
            })
            .await
            .unwrap();
    }

    let reopened = open(&file, &Settings::default()).await;
    let state = reopened.snapshot().await;
    assert_eq!(entry_ids(&state, "sleep"), vec!["pad", "quilt"]);
    assert_eq!(entry_ids(&state, "cook"), vec!["stove", "pillow"]);
}

#[tokio::test]
async fn lifecycle_edits_keep_the_file_contiguous() {
    let file = TestListFile::new(&[("sleep", "quilt pad"), ("cook", "stove pot")]);
    let coordinator = open(&file, &Settings::default()).await;

    let water = coordinator.add_container("Water").await.unwrap();
    let mut payload = gear_order::Payload::new();
    payload.insert("name".into(), serde_json::json!("filter"));
    let filter = coordinator.add_entry(&water.id, payload).await.unwrap();
    coordinator.remove_entry(&"quilt".into()).await.unwrap();
    coordinator.remove_container(&"cook".into()).await.unwrap();

    let stored = file.state();
    assert!(stored.is_valid(), "{:?}", stored.check_invariants());
    assert_eq!(stored.containers().len(), 2);
    assert_eq!(stored.entries(&water.id), &[filter][..]);
    assert_eq!(entry_ids(&stored, "sleep"), vec!["pad"]);
}

#[tokio::test]
async fn overlapping_moves_on_one_file_are_serialized() {
    let file = TestListFile::new(&[("a", "a0 a1 a2"), ("b", "b0 b1"), ("c", "c0")]);
    let coordinator = Arc::new(open(&file, &Settings::default()).await);

    let first = {
        let coordinator = Arc::clone(&coordinator);
        async move {
            coordinator
                .plan_and_commit_move(transfer("a0", "a", "b", 0))
                .await
        }
    };
    let second = {
        let coordinator = Arc::clone(&coordinator);
        async move {
            coordinator
                .plan_and_commit_move(transfer("b1", "b", "c", 1))
                .await
        }
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap().phase, MovePhase::Settled);
    assert_eq!(second.unwrap().phase, MovePhase::Settled);
    let stored = file.state();
    assert!(stored.is_valid(), "{:?}", stored.check_invariants());
    assert_eq!(stored, coordinator.snapshot().await);
}
