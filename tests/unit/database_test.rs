//! Unit tests for the local SQLite cache.
//!
//! Exercises migrations, the snapshot flush/load cycle, and the sync
//! metadata key-value table, against in-memory and on-disk databases.

use bookmarkbase::database::{CollectionStore, Database};
use bookmarkbase::types::bookmark::{BookmarkItem, FolderItem, TagItem};
use bookmarkbase::types::sync::StateSnapshot;

fn bookmark(id: &str, natural_key: &str) -> BookmarkItem {
    BookmarkItem {
        id: id.to_string(),
        natural_key: natural_key.to_string(),
        url: format!("https://x.com/u/status/{}", natural_key),
        folder: "Unsorted".to_string(),
        tags: vec!["rust".to_string()],
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

fn sample_snapshot() -> StateSnapshot {
    StateSnapshot {
        bookmarks: vec![bookmark("b1", "111"), bookmark("b2", "222")],
        folders: vec![FolderItem {
            id: "f1".to_string(),
            name: "Reading".to_string(),
            color: "#3b82f6".to_string(),
            parent_id: None,
            is_pinned: false,
        }],
        tags: vec![TagItem {
            id: "t1".to_string(),
            name: "rust".to_string(),
            color: "#10b981".to_string(),
        }],
        trash: Vec::new(),
    }
}

/// Opening an in-memory database runs migrations; an empty snapshot loads.
#[test]
fn test_open_in_memory_and_load_empty() {
    let db = Database::open_in_memory().expect("Failed to open in-memory database");
    let store = CollectionStore::new(db.connection());
    let snapshot = store.load_snapshot().unwrap();
    assert!(snapshot.bookmarks.is_empty());
    assert!(snapshot.folders.is_empty());
    assert!(snapshot.tags.is_empty());
    assert!(snapshot.trash.is_empty());
}

/// Flushing a snapshot and loading it back returns equal collections.
#[test]
fn test_flush_then_load_roundtrip() {
    let db = Database::open_in_memory().unwrap();
    let store = CollectionStore::new(db.connection());
    let snapshot = sample_snapshot();

    store.flush(&snapshot).unwrap();
    let loaded = store.load_snapshot().unwrap();

    assert_eq!(loaded, snapshot);
}

/// Items removed from the snapshot are deleted from their table on the
/// next flush.
#[test]
fn test_flush_removes_stale_rows() {
    let db = Database::open_in_memory().unwrap();
    let store = CollectionStore::new(db.connection());

    let mut snapshot = sample_snapshot();
    store.flush(&snapshot).unwrap();
    assert_eq!(store.count("bookmarks").unwrap(), 2);

    snapshot.bookmarks.remove(0);
    store.flush(&snapshot).unwrap();
    assert_eq!(store.count("bookmarks").unwrap(), 1);

    let loaded = store.load_snapshot().unwrap();
    assert_eq!(loaded.bookmarks.len(), 1);
    assert_eq!(loaded.bookmarks[0].id, "b2");
}

/// Flushing the same snapshot twice is idempotent.
#[test]
fn test_flush_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let store = CollectionStore::new(db.connection());
    let snapshot = sample_snapshot();

    store.flush(&snapshot).unwrap();
    store.flush(&snapshot).unwrap();

    assert_eq!(store.count("bookmarks").unwrap(), 2);
    assert_eq!(store.count("folders").unwrap(), 1);
    assert_eq!(store.count("tags").unwrap(), 1);
}

/// The sync metadata table stores and returns integer values.
#[test]
fn test_kv_get_set() {
    let db = Database::open_in_memory().unwrap();
    let store = CollectionStore::new(db.connection());

    assert_eq!(store.kv_get_i64("last_local_update").unwrap(), None);
    store.kv_set_i64("last_local_update", 1_234_567).unwrap();
    assert_eq!(
        store.kv_get_i64("last_local_update").unwrap(),
        Some(1_234_567)
    );

    store.kv_set_i64("last_local_update", 2_000_000).unwrap();
    assert_eq!(
        store.kv_get_i64("last_local_update").unwrap(),
        Some(2_000_000)
    );
}

/// Data written to a file-backed database survives reopening it.
#[test]
fn test_on_disk_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");

    {
        let db = Database::open(&path).unwrap();
        let store = CollectionStore::new(db.connection());
        store.flush(&sample_snapshot()).unwrap();
        store.kv_set_i64("last_local_update", 42).unwrap();
    }

    let db = Database::open(&path).unwrap();
    let store = CollectionStore::new(db.connection());
    let loaded = store.load_snapshot().unwrap();
    assert_eq!(loaded.bookmarks.len(), 2);
    assert_eq!(store.kv_get_i64("last_local_update").unwrap(), Some(42));
}
