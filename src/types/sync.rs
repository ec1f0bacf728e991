use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::bookmark::{BookmarkItem, FolderItem, TagItem};

/// Remote layout where all four arrays live in one user document.
pub const SCHEMA_VERSION_LEGACY: i32 = 1;
/// Remote layout with one document per item, grouped in per-collection
/// subtrees. Everything the engine writes is this version.
pub const SCHEMA_VERSION_PER_ITEM: i32 = 2;

/// The four replicated collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Bookmarks,
    Folders,
    Tags,
    Trash,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Bookmarks,
        CollectionKind::Folders,
        CollectionKind::Tags,
        CollectionKind::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Bookmarks => "bookmarks",
            CollectionKind::Folders => "folders",
            CollectionKind::Tags => "tags",
            CollectionKind::Trash => "trash",
        }
    }
}

/// Remote metadata document recorded after every successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// Server timestamp (millis) of the last committed sync.
    pub last_updated: i64,
    pub schema_version: i32,
}

/// One staged remote write.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    Upsert {
        collection: CollectionKind,
        key: String,
        body: Value,
    },
    Delete {
        collection: CollectionKind,
        key: String,
    },
}

impl RemoteOp {
    pub fn collection(&self) -> CollectionKind {
        match self {
            RemoteOp::Upsert { collection, .. } | RemoteOp::Delete { collection, .. } => {
                *collection
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            RemoteOp::Upsert { key, .. } | RemoteOp::Delete { key, .. } => key,
        }
    }
}

/// An immutable copy of the four canonical collections at a point in time.
///
/// Serves both as the diff baseline for the sync engine and as the payload
/// of pulls and migrations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub bookmarks: Vec<BookmarkItem>,
    pub folders: Vec<FolderItem>,
    pub tags: Vec<TagItem>,
    pub trash: Vec<BookmarkItem>,
}

impl StateSnapshot {
    /// Empty in the conflict-resolution sense: a session with only trashed
    /// items still counts as empty and will adopt the remote state.
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty() && self.folders.is_empty() && self.tags.is_empty()
    }
}

/// The legacy single-document remote blob (schema version 1). Items are
/// kept as raw values until migration parses them into typed collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDocument {
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default)]
    pub bookmarks: Vec<Value>,
    #[serde(default)]
    pub folders: Vec<Value>,
    #[serde(default)]
    pub tags: Vec<Value>,
    #[serde(default)]
    pub trash: Vec<Value>,
}

/// Shape of an exported/imported backup archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    #[serde(default)]
    pub bookmarks: Vec<Value>,
    #[serde(default)]
    pub custom_folders: Vec<Value>,
    #[serde(default)]
    pub custom_tags: Vec<Value>,
    #[serde(default)]
    pub trash: Vec<Value>,
    #[serde(default)]
    pub export_date: String,
    #[serde(default)]
    pub version: String,
}
