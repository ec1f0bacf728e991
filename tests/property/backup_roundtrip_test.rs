//! Property-based tests for backup export/import.
//!
//! Any library state must survive an export/import cycle unchanged,
//! including trashed items and their deletion timestamps.

use bookmarkbase::managers::library::Library;
use bookmarkbase::types::bookmark::{BookmarkItem, FolderItem, TagItem};
use bookmarkbase::types::config::SyncConfig;
use bookmarkbase::types::sync::StateSnapshot;
use proptest::prelude::*;

fn arb_bookmark(trashed: bool) -> impl Strategy<Value = BookmarkItem> {
    (
        "[a-z0-9]{8}",
        "[0-9]{6,12}",
        "[a-zA-Z ]{0,20}",
        proptest::collection::vec("[a-z]{1,8}", 0..4),
        0..10_000_000i64,
    )
        .prop_map(move |(id, natural_key, description, tags, timestamp)| BookmarkItem {
            url: format!("https://x.com/u/status/{}", natural_key),
            id,
            natural_key,
            folder: "Unsorted".to_string(),
            tags,
            description,
            timestamp,
            author_name: "Author".to_string(),
            author_handle: "@author".to_string(),
            author_pic: String::new(),
            post_text: "text".to_string(),
            media_urls: Vec::new(),
            media_type: String::new(),
            poster_url: String::new(),
            deleted_at: if trashed { Some(timestamp) } else { None },
        })
}

fn arb_snapshot() -> impl Strategy<Value = StateSnapshot> {
    (
        proptest::collection::vec(arb_bookmark(false), 0..20),
        proptest::collection::vec(("[a-z0-9]{8}", "[A-Za-z]{1,12}"), 0..5),
        proptest::collection::vec(("[a-z0-9]{8}", "[a-z]{1,12}"), 0..5),
        proptest::collection::vec(arb_bookmark(true), 0..5),
    )
        .prop_map(|(bookmarks, folders, tags, trash)| StateSnapshot {
            bookmarks,
            folders: folders
                .into_iter()
                .map(|(id, name)| FolderItem {
                    id,
                    name,
                    color: "#3b82f6".to_string(),
                    parent_id: None,
                    is_pinned: false,
                })
                .collect(),
            tags: tags
                .into_iter()
                .map(|(id, name)| TagItem {
                    id,
                    name,
                    color: "#10b981".to_string(),
                })
                .collect(),
            trash,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Export then import reproduces the exact library state.
    #[test]
    fn export_import_roundtrip(snapshot in arb_snapshot()) {
        let mut lib = Library::new();
        lib.replace_from_snapshot(snapshot.clone());

        let json = lib.export_backup("2026-08-27").unwrap();

        let mut restored = Library::new();
        restored.import_backup(&json, &SyncConfig::default()).unwrap();

        prop_assert_eq!(restored.snapshot(), snapshot);
    }

    /// The exported archive always parses as the documented backup shape
    /// with the four collections present.
    #[test]
    fn export_has_backup_shape(snapshot in arb_snapshot()) {
        let mut lib = Library::new();
        let bookmarks = snapshot.bookmarks.len();
        let trash = snapshot.trash.len();
        lib.replace_from_snapshot(snapshot);

        let json = lib.export_backup("2026-08-27").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(value["bookmarks"].as_array().unwrap().len(), bookmarks);
        prop_assert_eq!(value["trash"].as_array().unwrap().len(), trash);
        prop_assert!(value["customFolders"].is_array());
        prop_assert!(value["customTags"].is_array());
        prop_assert_eq!(value["exportDate"].as_str().unwrap(), "2026-08-27");
    }
}
