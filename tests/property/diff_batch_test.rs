//! Property-based tests for the diff planner and batch flushing.
//!
//! Every staged operation set must split into commits the provider will
//! accept, and the planned diff must match the actual change set exactly.

use bookmarkbase::database::{CollectionStore, Database};
use bookmarkbase::services::remote_store::{MemoryRemoteStore, PROVIDER_OP_LIMIT};
use bookmarkbase::services::sync_engine::{plan_ops, SyncEngine};
use bookmarkbase::types::bookmark::BookmarkItem;
use bookmarkbase::types::sync::{CollectionKind, RemoteOp, StateSnapshot};
use proptest::prelude::*;

fn bookmark(i: usize) -> BookmarkItem {
    BookmarkItem {
        id: format!("b{}", i),
        natural_key: format!("{}", 1_000_000 + i),
        url: format!("https://x.com/u/status/{}", 1_000_000 + i),
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
        bookmarks: (0..count).map(bookmark).collect(),
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    /// For any library size, every committed batch stays under the
    /// provider cap and together they carry every staged operation.
    #[test]
    fn batches_respect_provider_cap(count in 0..1500usize) {
        let db = Database::open_in_memory().unwrap();
        let store = CollectionStore::new(db.connection());
        let remote = MemoryRemoteStore::new();

        let mut engine = SyncEngine::new(490);
        let state = snapshot_of(count);
        engine.request(true);
        engine.drain("u1", &state, &remote, &store, 0).unwrap();

        let sizes = remote.commit_sizes();
        prop_assert!(sizes.iter().all(|s| *s <= PROVIDER_OP_LIMIT));
        prop_assert_eq!(sizes.iter().sum::<usize>(), count);
        prop_assert_eq!(
            remote.collection_len("u1", CollectionKind::Bookmarks),
            count
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// The planned diff is exactly the change set: one upsert per modified
    /// or added item, one delete per removed item, nothing else.
    #[test]
    fn diff_matches_change_set(
        base in 1..60usize,
        modified in proptest::collection::hash_set(0..60usize, 0..10),
        added in 0..10usize,
        removed in proptest::collection::hash_set(0..60usize, 0..10),
    ) {
        let prev = snapshot_of(base);
        let modified: Vec<usize> = modified.into_iter().filter(|i| *i < base).collect();
        let removed: Vec<usize> = removed
            .into_iter()
            .filter(|i| *i < base && !modified.contains(i))
            .collect();

        let mut curr = prev.clone();
        for &i in &modified {
            curr.bookmarks[i].description = "edited".to_string();
        }
        curr.bookmarks.retain(|b| {
            !removed.iter().any(|&i| b.id == format!("b{}", i))
        });
        for i in 0..added {
            curr.bookmarks.push(bookmark(10_000 + i));
        }

        let ops = plan_ops(Some(&prev), &curr).unwrap();
        let upserts = ops.iter().filter(|op| matches!(op, RemoteOp::Upsert { .. })).count();
        let deletes = ops.iter().filter(|op| matches!(op, RemoteOp::Delete { .. })).count();

        prop_assert_eq!(upserts, modified.len() + added);
        prop_assert_eq!(deletes, removed.len());
    }
}

/// The reference sizing case: 1200 staged operations flush as 490, 490
/// and 220.
#[test]
fn twelve_hundred_ops_flush_as_three_batches() {
    let db = Database::open_in_memory().unwrap();
    let store = CollectionStore::new(db.connection());
    let remote = MemoryRemoteStore::new();

    let mut engine = SyncEngine::new(490);
    engine.request(true);
    engine
        .drain("u1", &snapshot_of(1200), &remote, &store, 0)
        .unwrap();

    assert_eq!(remote.commit_sizes(), vec![490, 490, 220]);
}
