//! Remote sync engine: minimal-diff replication to the document store.
//!
//! Given the last successfully synced snapshot and the current canonical
//! state, the engine stages one upsert per new-or-changed item and one
//! delete per vanished key, commits the staged writes in provider-safe
//! batches, and records sync metadata. Requests go through a single-consumer
//! queue so only one sync is ever in flight per identity; a request made
//! while one runs is appended, never run concurrently.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::database::collections::{CollectionStore, LAST_LOCAL_UPDATE_KEY};
use crate::services::remote_store::RemoteStore;
use crate::types::errors::SyncError;
use crate::types::sync::{
    CollectionKind, RemoteOp, StateSnapshot, SyncMetadata, SCHEMA_VERSION_PER_ITEM,
};

/// A queued sync request. Forced requests are user-initiated: their
/// failures surface to the caller instead of being swallowed.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest {
    pub force: bool,
}

/// What one completed sync pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub upserts: usize,
    pub deletes: usize,
    pub batches: usize,
}

/// The sync engine. Owns the diff baseline (`prev_snapshot`) and the
/// serial request queue.
pub struct SyncEngine {
    prev_snapshot: Option<StateSnapshot>,
    pending: VecDeque<SyncRequest>,
    in_flight: bool,
    flush_threshold: usize,
}

impl SyncEngine {
    pub fn new(flush_threshold: usize) -> Self {
        Self {
            prev_snapshot: None,
            pending: VecDeque::new(),
            in_flight: false,
            flush_threshold,
        }
    }

    /// Clears the diff baseline so the next sync is a full push.
    pub fn clear_baseline(&mut self) {
        self.prev_snapshot = None;
    }

    /// Adopts `snapshot` as the baseline without transferring anything.
    pub fn adopt_baseline(&mut self, snapshot: StateSnapshot) {
        self.prev_snapshot = Some(snapshot);
    }

    pub fn baseline(&self) -> Option<&StateSnapshot> {
        self.prev_snapshot.as_ref()
    }

    /// Appends a sync request to the serial queue.
    pub fn request(&mut self, force: bool) {
        self.pending.push_back(SyncRequest { force });
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains the request queue, one sync at a time, against the current
    /// canonical state.
    ///
    /// Re-entrant calls (a request made from inside a running sync) return
    /// immediately; their requests stay queued for the active drain.
    /// Background failures are logged and swallowed; the unchanged
    /// baseline makes the next cycle recompute the same diff. A forced
    /// request's failure stops the drain and is returned.
    pub fn drain(
        &mut self,
        uid: &str,
        state: &StateSnapshot,
        remote: &dyn RemoteStore,
        store: &CollectionStore,
        now_ms: i64,
    ) -> Result<Vec<SyncReport>, SyncError> {
        if self.in_flight {
            return Ok(Vec::new());
        }
        self.in_flight = true;
        let result = self.drain_inner(uid, state, remote, store, now_ms);
        self.in_flight = false;
        result
    }

    fn drain_inner(
        &mut self,
        uid: &str,
        state: &StateSnapshot,
        remote: &dyn RemoteStore,
        store: &CollectionStore,
        now_ms: i64,
    ) -> Result<Vec<SyncReport>, SyncError> {
        let mut reports = Vec::new();
        while let Some(request) = self.pending.pop_front() {
            match self.run_sync(uid, state, remote, store, now_ms, request.force) {
                Ok(Some(report)) => {
                    debug!(
                        upserts = report.upserts,
                        deletes = report.deletes,
                        batches = report.batches,
                        "sync pass committed"
                    );
                    reports.push(report);
                }
                Ok(None) => {}
                Err(err) if request.force => return Err(err),
                Err(err) => {
                    warn!(error = %err, "background sync failed; diff retried next cycle");
                }
            }
        }
        Ok(reports)
    }

    /// One sync pass. On success the baseline advances to `state`; on any
    /// commit failure it is left untouched so the retry recomputes the
    /// same diff instead of losing it.
    fn run_sync(
        &mut self,
        uid: &str,
        state: &StateSnapshot,
        remote: &dyn RemoteStore,
        store: &CollectionStore,
        now_ms: i64,
        force: bool,
    ) -> Result<Option<SyncReport>, SyncError> {
        // Never auto-push an entirely empty state over existing remote data.
        if !force && state.is_empty() {
            return Ok(None);
        }

        let ops = plan_ops(self.prev_snapshot.as_ref(), state)?;
        let upserts = ops
            .iter()
            .filter(|op| matches!(op, RemoteOp::Upsert { .. }))
            .count();
        let deletes = ops.len() - upserts;

        let mut batches = 0;
        let mut staged: Vec<RemoteOp> = Vec::new();
        for op in ops {
            staged.push(op);
            if staged.len() >= self.flush_threshold {
                remote.commit(uid, &staged)?;
                batches += 1;
                staged.clear();
            }
        }
        if !staged.is_empty() {
            remote.commit(uid, &staged)?;
            batches += 1;
        }

        remote.write_metadata(
            uid,
            &SyncMetadata {
                last_updated: remote.server_time_millis(),
                schema_version: SCHEMA_VERSION_PER_ITEM,
            },
        )?;
        store
            .kv_set_i64(LAST_LOCAL_UPDATE_KEY, now_ms)
            .map_err(|e| SyncError::DatabaseError(e.to_string()))?;

        self.prev_snapshot = Some(state.clone());
        Ok(Some(SyncReport {
            upserts,
            deletes,
            batches,
        }))
    }
}

/// Document key of a remote item: its `id`, or its `name` for legacy items
/// that predate generated ids. Items without either are skipped.
pub fn doc_key(value: &Value) -> Option<String> {
    for field in ["id", "name"] {
        match value.get(field) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Stages the upsert/delete set for one collection.
///
/// With no previous snapshot (first sync for this identity) every current
/// item is upserted. Otherwise an item is upserted when its key is new or
/// its document changed (arrays compared element-wise), and a delete is
/// staged for every key that vanished from the current snapshot.
pub fn plan_collection_ops(
    kind: CollectionKind,
    prev: Option<&[Value]>,
    curr: &[Value],
    ops: &mut Vec<RemoteOp>,
) {
    let prev = match prev {
        Some(prev) => prev,
        None => {
            for item in curr {
                if let Some(key) = doc_key(item) {
                    ops.push(RemoteOp::Upsert {
                        collection: kind,
                        key,
                        body: item.clone(),
                    });
                }
            }
            return;
        }
    };

    let prev_map: HashMap<String, &Value> = prev
        .iter()
        .filter_map(|v| doc_key(v).map(|k| (k, v)))
        .collect();
    let curr_map: HashMap<String, &Value> = curr
        .iter()
        .filter_map(|v| doc_key(v).map(|k| (k, v)))
        .collect();

    for item in curr {
        let key = match doc_key(item) {
            Some(key) => key,
            None => continue,
        };
        match prev_map.get(&key) {
            Some(prev_item) if *prev_item == item => {}
            _ => ops.push(RemoteOp::Upsert {
                collection: kind,
                key,
                body: item.clone(),
            }),
        }
    }

    for item in prev {
        let key = match doc_key(item) {
            Some(key) => key,
            None => continue,
        };
        if !curr_map.contains_key(&key) {
            ops.push(RemoteOp::Delete {
                collection: kind,
                key,
            });
        }
    }
}

/// Computes the full staged operation list for all four collections.
pub fn plan_ops(
    prev: Option<&StateSnapshot>,
    curr: &StateSnapshot,
) -> Result<Vec<RemoteOp>, SyncError> {
    let mut ops = Vec::new();
    plan_collection_ops(
        CollectionKind::Bookmarks,
        prev.map(|p| to_values(&p.bookmarks)).transpose()?.as_deref(),
        &to_values(&curr.bookmarks)?,
        &mut ops,
    );
    plan_collection_ops(
        CollectionKind::Folders,
        prev.map(|p| to_values(&p.folders)).transpose()?.as_deref(),
        &to_values(&curr.folders)?,
        &mut ops,
    );
    plan_collection_ops(
        CollectionKind::Tags,
        prev.map(|p| to_values(&p.tags)).transpose()?.as_deref(),
        &to_values(&curr.tags)?,
        &mut ops,
    );
    plan_collection_ops(
        CollectionKind::Trash,
        prev.map(|p| to_values(&p.trash)).transpose()?.as_deref(),
        &to_values(&curr.trash)?,
        &mut ops,
    );
    Ok(ops)
}

fn to_values<T: Serialize>(items: &[T]) -> Result<Vec<Value>, SyncError> {
    items
        .iter()
        .map(|item| {
            serde_json::to_value(item).map_err(|e| SyncError::SerializationError(e.to_string()))
        })
        .collect()
}
