//! Remote multi-device document store interface.
//!
//! The sync engine and bootstrap loader only see this trait; production
//! wires a cloud-backed client, tests and the demo binary use
//! [`MemoryRemoteStore`]. The store keeps one document per item under
//! per-collection subtrees (schema version 2), plus a metadata document
//! and, for accounts that predate the per-item layout, a legacy blob.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::types::errors::SyncError;
use crate::types::sync::{CollectionKind, LegacyDocument, RemoteOp, SyncMetadata};

/// Trait defining remote document store operations.
pub trait RemoteStore {
    fn read_metadata(&self, uid: &str) -> Result<Option<SyncMetadata>, SyncError>;
    fn write_metadata(&self, uid: &str, meta: &SyncMetadata) -> Result<(), SyncError>;
    /// The single-document blob written by schema-version-1 clients, if any.
    fn read_legacy_document(&self, uid: &str) -> Result<Option<LegacyDocument>, SyncError>;
    /// Strips the bulk arrays from the legacy document after migration.
    fn remove_legacy_fields(&self, uid: &str) -> Result<(), SyncError>;
    fn read_collection(&self, uid: &str, kind: CollectionKind) -> Result<Vec<Value>, SyncError>;
    /// Atomically applies one batch of staged writes. The provider rejects
    /// batches larger than its per-commit operation cap.
    fn commit(&self, uid: &str, batch: &[RemoteOp]) -> Result<(), SyncError>;
    /// Server-side clock, used for the metadata timestamp.
    fn server_time_millis(&self) -> i64;
}

/// Hard per-commit operation cap of the reference provider.
pub const PROVIDER_OP_LIMIT: usize = 500;

#[derive(Default)]
struct UserDocs {
    metadata: Option<SyncMetadata>,
    legacy: Option<LegacyDocument>,
    collections: HashMap<CollectionKind, BTreeMap<String, Value>>,
}

#[derive(Default)]
struct RemoteState {
    users: HashMap<String, UserDocs>,
    server_time: i64,
    fail_commits: u32,
    commit_sizes: Vec<usize>,
}

/// In-memory remote store double with failure injection and a commit log.
#[derive(Default)]
pub struct MemoryRemoteStore {
    inner: RefCell<RemoteState>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_server_time(&self, millis: i64) {
        self.inner.borrow_mut().server_time = millis;
    }

    /// Makes the next `n` commits fail with a network error.
    pub fn fail_next_commits(&self, n: u32) {
        self.inner.borrow_mut().fail_commits = n;
    }

    /// Sizes of every batch committed so far, in order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.inner.borrow().commit_sizes.clone()
    }

    pub fn collection_len(&self, uid: &str, kind: CollectionKind) -> usize {
        self.inner
            .borrow()
            .users
            .get(uid)
            .and_then(|u| u.collections.get(&kind))
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn document(&self, uid: &str, kind: CollectionKind, key: &str) -> Option<Value> {
        self.inner
            .borrow()
            .users
            .get(uid)
            .and_then(|u| u.collections.get(&kind))
            .and_then(|c| c.get(key))
            .cloned()
    }

    /// Seeds a legacy single-document blob, as left behind by an old client.
    pub fn put_legacy_document(&self, uid: &str, doc: LegacyDocument) {
        self.inner
            .borrow_mut()
            .users
            .entry(uid.to_string())
            .or_default()
            .legacy = Some(doc);
    }

    pub fn put_metadata(&self, uid: &str, meta: SyncMetadata) {
        self.inner
            .borrow_mut()
            .users
            .entry(uid.to_string())
            .or_default()
            .metadata = Some(meta);
    }

    /// Seeds a per-item document directly, bypassing the commit path.
    pub fn put_document(&self, uid: &str, kind: CollectionKind, key: &str, body: Value) {
        self.inner
            .borrow_mut()
            .users
            .entry(uid.to_string())
            .or_default()
            .collections
            .entry(kind)
            .or_default()
            .insert(key.to_string(), body);
    }

    pub fn has_legacy_document(&self, uid: &str) -> bool {
        self.inner
            .borrow()
            .users
            .get(uid)
            .map(|u| u.legacy.is_some())
            .unwrap_or(false)
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn read_metadata(&self, uid: &str) -> Result<Option<SyncMetadata>, SyncError> {
        Ok(self.inner.borrow().users.get(uid).and_then(|u| u.metadata))
    }

    fn write_metadata(&self, uid: &str, meta: &SyncMetadata) -> Result<(), SyncError> {
        self.inner
            .borrow_mut()
            .users
            .entry(uid.to_string())
            .or_default()
            .metadata = Some(*meta);
        Ok(())
    }

    fn read_legacy_document(&self, uid: &str) -> Result<Option<LegacyDocument>, SyncError> {
        Ok(self
            .inner
            .borrow()
            .users
            .get(uid)
            .and_then(|u| u.legacy.clone()))
    }

    fn remove_legacy_fields(&self, uid: &str) -> Result<(), SyncError> {
        if let Some(user) = self.inner.borrow_mut().users.get_mut(uid) {
            user.legacy = None;
        }
        Ok(())
    }

    fn read_collection(&self, uid: &str, kind: CollectionKind) -> Result<Vec<Value>, SyncError> {
        Ok(self
            .inner
            .borrow()
            .users
            .get(uid)
            .and_then(|u| u.collections.get(&kind))
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    fn commit(&self, uid: &str, batch: &[RemoteOp]) -> Result<(), SyncError> {
        if batch.len() > PROVIDER_OP_LIMIT {
            return Err(SyncError::NetworkError(format!(
                "batch of {} operations exceeds the {}-op commit limit",
                batch.len(),
                PROVIDER_OP_LIMIT
            )));
        }
        let mut state = self.inner.borrow_mut();
        if state.fail_commits > 0 {
            state.fail_commits -= 1;
            return Err(SyncError::NetworkError(
                "injected commit failure".to_string(),
            ));
        }
        let user = state.users.entry(uid.to_string()).or_default();
        for op in batch {
            let collection = user.collections.entry(op.collection()).or_default();
            match op {
                RemoteOp::Upsert { key, body, .. } => {
                    collection.insert(key.clone(), body.clone());
                }
                RemoteOp::Delete { key, .. } => {
                    collection.remove(key);
                }
            }
        }
        state.commit_sizes.push(batch.len());
        Ok(())
    }

    fn server_time_millis(&self) -> i64 {
        self.inner.borrow().server_time
    }
}
