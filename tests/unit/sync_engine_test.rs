//! Unit tests for the diff planner and the sync engine.
//!
//! Uses the in-memory remote store double, which records committed batch
//! sizes and can inject commit failures.

use bookmarkbase::database::{CollectionStore, Database};
use bookmarkbase::services::remote_store::{MemoryRemoteStore, RemoteStore};
use bookmarkbase::services::sync_engine::{doc_key, plan_ops, SyncEngine};
use bookmarkbase::types::bookmark::BookmarkItem;
use bookmarkbase::types::errors::SyncError;
use bookmarkbase::types::sync::{CollectionKind, RemoteOp, StateSnapshot};
use serde_json::json;

fn bookmark(id: &str, natural_key: &str) -> BookmarkItem {
    BookmarkItem {
        id: id.to_string(),
        natural_key: natural_key.to_string(),
        url: format!("https://x.com/u/status/{}", natural_key),
        folder: "Unsorted".to_string(),
        tags: Vec::new(),
        description: String::new(),
        timestamp: 0,
        author_name: String::new(),
        author_handle: String::new(),
        author_pic: String::new(),
        post_text: String::new(),
        media_urls: Vec::new(),
        media_type: String::new(),
        poster_url: String::new(),
        deleted_at: None,
    }
}

fn snapshot_of(count: usize) -> StateSnapshot {
    StateSnapshot {
        bookmarks: (0..count)
            .map(|i| bookmark(&format!("b{}", i), &format!("{}", 1_000_000 + i)))
            .collect(),
        ..Default::default()
    }
}

// === doc_key ===

#[test]
fn test_doc_key_prefers_id_then_name() {
    assert_eq!(doc_key(&json!({"id": "abc"})), Some("abc".to_string()));
    assert_eq!(doc_key(&json!({"id": 42})), Some("42".to_string()));
    assert_eq!(
        doc_key(&json!({"name": "reading"})),
        Some("reading".to_string())
    );
    assert_eq!(doc_key(&json!({"id": "", "name": "x"})), Some("x".to_string()));
    assert_eq!(doc_key(&json!({"url": "https://x.com"})), None);
}

// === plan_ops ===

/// With no baseline, every item becomes an upsert.
#[test]
fn test_no_baseline_full_push() {
    let curr = snapshot_of(3);
    let ops = plan_ops(None, &curr).unwrap();

    assert_eq!(ops.len(), 3);
    assert!(ops.iter().all(|op| matches!(op, RemoteOp::Upsert { .. })));
}

/// 3 modified + 2 added + 1 removed against a 10-item baseline produces
/// exactly 5 upserts and 1 delete.
#[test]
fn test_diff_upserts_and_deletes() {
    let prev = snapshot_of(10);
    let mut curr = prev.clone();
    for b in curr.bookmarks.iter_mut().take(3) {
        b.description = "edited".to_string();
    }
    curr.bookmarks.push(bookmark("new1", "2000001"));
    curr.bookmarks.push(bookmark("new2", "2000002"));
    curr.bookmarks.retain(|b| b.id != "b9");

    let ops = plan_ops(Some(&prev), &curr).unwrap();

    let upserts: Vec<&RemoteOp> = ops
        .iter()
        .filter(|op| matches!(op, RemoteOp::Upsert { .. }))
        .collect();
    let deletes: Vec<&RemoteOp> = ops
        .iter()
        .filter(|op| matches!(op, RemoteOp::Delete { .. }))
        .collect();
    assert_eq!(upserts.len(), 5);
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].key(), "b9");
}

/// An unchanged snapshot plans no operations.
#[test]
fn test_identical_snapshots_plan_nothing() {
    let snap = snapshot_of(5);
    let ops = plan_ops(Some(&snap), &snap).unwrap();
    assert!(ops.is_empty());
}

/// Changes across collections are all planned, tagged with their kind.
#[test]
fn test_diff_spans_collections() {
    let mut prev = snapshot_of(1);
    prev.tags.push(bookmarkbase::types::bookmark::TagItem {
        id: "t1".to_string(),
        name: "old".to_string(),
        color: String::new(),
    });
    let mut curr = prev.clone();
    curr.tags.clear();
    curr.folders.push(bookmarkbase::types::bookmark::FolderItem {
        id: "f1".to_string(),
        name: "Reading".to_string(),
        color: String::new(),
        parent_id: None,
        is_pinned: false,
    });

    let ops = plan_ops(Some(&prev), &curr).unwrap();
    assert_eq!(ops.len(), 2);
    assert!(ops
        .iter()
        .any(|op| op.collection() == CollectionKind::Folders
            && matches!(op, RemoteOp::Upsert { .. })));
    assert!(ops
        .iter()
        .any(|op| op.collection() == CollectionKind::Tags
            && matches!(op, RemoteOp::Delete { .. })));
}

// === SyncEngine ===

fn fixture() -> (Database, MemoryRemoteStore) {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    (db, MemoryRemoteStore::new())
}

/// A first sync pushes everything and records metadata and the local
/// sync timestamp.
#[test]
fn test_first_sync_full_push() {
    let (db, remote) = fixture();
    let store = CollectionStore::new(db.connection());
    remote.set_server_time(9_000);

    let mut engine = SyncEngine::new(490);
    let state = snapshot_of(3);
    engine.request(false);
    let reports = engine.drain("u1", &state, &remote, &store, 8_000).unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].upserts, 3);
    assert_eq!(remote.collection_len("u1", CollectionKind::Bookmarks), 3);

    let meta = remote.read_metadata("u1").unwrap();
    assert_eq!(meta.unwrap().last_updated, 9_000);
    assert_eq!(store.kv_get_i64("last_local_update").unwrap(), Some(8_000));
}

/// 1200 staged operations commit as batches of 490, 490 and 220.
#[test]
fn test_batch_flush_thresholds() {
    let (db, remote) = fixture();
    let store = CollectionStore::new(db.connection());

    let mut engine = SyncEngine::new(490);
    let state = snapshot_of(1200);
    engine.request(false);
    engine.drain("u1", &state, &remote, &store, 0).unwrap();

    assert_eq!(remote.commit_sizes(), vec![490, 490, 220]);
    assert_eq!(remote.collection_len("u1", CollectionKind::Bookmarks), 1200);
}

/// An unforced sync of an empty library is skipped entirely.
#[test]
fn test_empty_state_skipped_unless_forced() {
    let (db, remote) = fixture();
    let store = CollectionStore::new(db.connection());

    let mut engine = SyncEngine::new(490);
    engine.request(false);
    let reports = engine
        .drain("u1", &StateSnapshot::default(), &remote, &store, 0)
        .unwrap();

    assert!(reports.is_empty());
    assert!(remote.read_metadata("u1").unwrap().is_none());

    engine.request(true);
    let reports = engine
        .drain("u1", &StateSnapshot::default(), &remote, &store, 0)
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert!(remote.read_metadata("u1").unwrap().is_some());
}

/// A failed background commit keeps the baseline, so the retry resends
/// the same diff.
#[test]
fn test_background_failure_keeps_baseline() {
    let (db, remote) = fixture();
    let store = CollectionStore::new(db.connection());

    let mut engine = SyncEngine::new(490);
    let state = snapshot_of(2);

    remote.fail_next_commits(1);
    engine.request(false);
    let reports = engine.drain("u1", &state, &remote, &store, 0).unwrap();
    assert!(reports.is_empty());
    assert!(engine.baseline().is_none());
    assert_eq!(remote.collection_len("u1", CollectionKind::Bookmarks), 0);

    engine.request(false);
    let reports = engine.drain("u1", &state, &remote, &store, 100).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].upserts, 2);
    assert_eq!(remote.collection_len("u1", CollectionKind::Bookmarks), 2);
}

/// A forced request's failure surfaces to the caller.
#[test]
fn test_forced_failure_propagates() {
    let (db, remote) = fixture();
    let store = CollectionStore::new(db.connection());

    let mut engine = SyncEngine::new(490);
    remote.fail_next_commits(1);
    engine.request(true);
    let err = engine
        .drain("u1", &snapshot_of(1), &remote, &store, 0)
        .unwrap_err();
    assert!(matches!(err, SyncError::NetworkError(_)));
}

/// After a successful sync, a second pass with the same state plans and
/// commits nothing new.
#[test]
fn test_second_sync_is_a_noop_diff() {
    let (db, remote) = fixture();
    let store = CollectionStore::new(db.connection());

    let mut engine = SyncEngine::new(490);
    let state = snapshot_of(4);
    engine.request(false);
    engine.drain("u1", &state, &remote, &store, 0).unwrap();
    let commits_after_first = remote.commit_sizes().len();

    engine.request(false);
    let reports = engine.drain("u1", &state, &remote, &store, 100).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].upserts, 0);
    assert_eq!(remote.commit_sizes().len(), commits_after_first);
}

/// Deleting an item locally deletes its remote document on the next sync.
#[test]
fn test_delete_propagates_to_remote() {
    let (db, remote) = fixture();
    let store = CollectionStore::new(db.connection());

    let mut engine = SyncEngine::new(490);
    let state = snapshot_of(2);
    engine.request(false);
    engine.drain("u1", &state, &remote, &store, 0).unwrap();

    let mut smaller = state.clone();
    smaller.bookmarks.remove(0);
    engine.request(false);
    let reports = engine.drain("u1", &smaller, &remote, &store, 100).unwrap();

    assert_eq!(reports[0].deletes, 1);
    assert_eq!(remote.collection_len("u1", CollectionKind::Bookmarks), 1);
}
