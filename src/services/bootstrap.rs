//! First-contact loader for a signed-in identity.
//!
//! On sign-in the loader compares the remote metadata timestamp against the
//! last local update and decides, once per identity per session, whether to
//! migrate a legacy account, pull the remote state down, push the local
//! state up, or leave both sides alone. The two-second tolerance window
//! keeps clock skew from flapping between pull and push.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::database::collections::{CollectionStore, LAST_LOCAL_UPDATE_KEY};
use crate::managers::library::Library;
use crate::services::debouncer::CloudUpdateGuard;
use crate::services::remote_store::RemoteStore;
use crate::services::sync_engine::SyncEngine;
use crate::types::config::SyncConfig;
use crate::types::errors::{BootstrapError, SyncError};
use crate::types::sync::{
    CollectionKind, LegacyDocument, StateSnapshot, SyncMetadata, SCHEMA_VERSION_PER_ITEM,
};

/// What the loader decided to do for this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapAction {
    /// Legacy single-document account: convert and force a full push.
    Migrate,
    /// Remote is authoritative: replace local state with the remote one.
    Pull,
    /// Local is authoritative: force a full push to the remote.
    Push,
    /// Both sides agree within the tolerance window: adopt the local
    /// state as the diff baseline and transfer nothing.
    AdoptBaseline,
}

/// Pure conflict decision, separated from the IO so it can be tested
/// exhaustively.
///
/// With no metadata the account is either legacy (migrate) or brand new
/// (push what we have, or just adopt an empty baseline). With metadata,
/// whichever side is newer by more than `tolerance_ms` wins; inside the
/// window neither side transfers. An empty local library always pulls,
/// regardless of timestamps.
pub fn decide(
    metadata: Option<&SyncMetadata>,
    legacy_present: bool,
    local_time: i64,
    tolerance_ms: i64,
    local_empty: bool,
) -> BootstrapAction {
    let meta = match metadata {
        Some(meta) => meta,
        None => {
            if legacy_present {
                return BootstrapAction::Migrate;
            }
            if local_empty {
                return BootstrapAction::AdoptBaseline;
            }
            return BootstrapAction::Push;
        }
    };
    if meta.schema_version < SCHEMA_VERSION_PER_ITEM && legacy_present {
        return BootstrapAction::Migrate;
    }
    if local_empty {
        return BootstrapAction::Pull;
    }
    let remote_time = meta.last_updated;
    if remote_time > local_time + tolerance_ms {
        BootstrapAction::Pull
    } else if local_time > remote_time + tolerance_ms {
        BootstrapAction::Push
    } else {
        BootstrapAction::AdoptBaseline
    }
}

/// What a completed bootstrap run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// This identity was already loaded this session.
    AlreadyLoaded,
    Migrated,
    Pulled,
    Pushed,
    Baseline,
}

/// Runs the first-contact decision at most once per identity per session.
#[derive(Default)]
pub struct BootstrapLoader {
    last_uid: Option<String>,
}

impl BootstrapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the loaded identity, so the next run decides again. Called
    /// on sign-out.
    pub fn reset(&mut self) {
        self.last_uid = None;
    }

    /// Decides and applies the first-contact action for `uid`.
    ///
    /// The identity is marked loaded before any IO, so a failed run is not
    /// retried until the next session rather than looping every tick.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &mut self,
        uid: &str,
        library: &mut Library,
        engine: &mut SyncEngine,
        remote: &dyn RemoteStore,
        store: &CollectionStore,
        guard: &mut CloudUpdateGuard,
        config: &SyncConfig,
        now_ms: i64,
    ) -> Result<BootstrapOutcome, BootstrapError> {
        if self.last_uid.as_deref() == Some(uid) {
            return Ok(BootstrapOutcome::AlreadyLoaded);
        }
        self.last_uid = Some(uid.to_string());

        let metadata = remote.read_metadata(uid)?;
        let needs_legacy_check = match metadata {
            None => true,
            Some(meta) => meta.schema_version < SCHEMA_VERSION_PER_ITEM,
        };
        let legacy = if needs_legacy_check {
            remote.read_legacy_document(uid)?
        } else {
            None
        };

        let local_time = store
            .kv_get_i64(LAST_LOCAL_UPDATE_KEY)
            .map_err(|e| BootstrapError::DatabaseError(e.to_string()))?
            .unwrap_or(0);
        let local_state = library.snapshot();

        let action = decide(
            metadata.as_ref(),
            legacy.is_some(),
            local_time,
            config.tolerance_window_ms,
            local_state.is_empty(),
        );
        info!(uid, ?action, "bootstrap decision");

        match action {
            BootstrapAction::Migrate => {
                // `legacy` is always present when decide() picks Migrate.
                let doc = legacy.unwrap_or_default();
                let migrated = parse_legacy_document(&doc)?;
                library.replace_from_snapshot(migrated.clone());
                store
                    .flush(&migrated)
                    .map_err(|e| BootstrapError::DatabaseError(e.to_string()))?;
                guard.engage(now_ms, config.cloud_guard_ms);
                engine.clear_baseline();
                engine.request(true);
                engine.drain(uid, &migrated, remote, store, now_ms)?;
                remote.remove_legacy_fields(uid)?;
                Ok(BootstrapOutcome::Migrated)
            }
            BootstrapAction::Pull => {
                let pulled = read_remote_snapshot(uid, remote)?;
                library.replace_from_snapshot(pulled.clone());
                store
                    .flush(&pulled)
                    .map_err(|e| BootstrapError::DatabaseError(e.to_string()))?;
                guard.engage(now_ms, config.cloud_guard_ms);
                if let Some(meta) = metadata {
                    store
                        .kv_set_i64(LAST_LOCAL_UPDATE_KEY, meta.last_updated)
                        .map_err(|e| BootstrapError::DatabaseError(e.to_string()))?;
                }
                engine.adopt_baseline(pulled);
                Ok(BootstrapOutcome::Pulled)
            }
            BootstrapAction::Push => {
                engine.clear_baseline();
                engine.request(true);
                engine.drain(uid, &local_state, remote, store, now_ms)?;
                Ok(BootstrapOutcome::Pushed)
            }
            BootstrapAction::AdoptBaseline => {
                engine.adopt_baseline(local_state);
                Ok(BootstrapOutcome::Baseline)
            }
        }
    }
}

/// Converts a legacy single-document blob into a typed snapshot. Any item
/// that no longer parses fails the whole migration, leaving the legacy
/// document in place for a fixed client to retry.
fn parse_legacy_document(doc: &LegacyDocument) -> Result<StateSnapshot, BootstrapError> {
    Ok(StateSnapshot {
        bookmarks: parse_items(&doc.bookmarks, CollectionKind::Bookmarks)?,
        folders: parse_items(&doc.folders, CollectionKind::Folders)?,
        tags: parse_items(&doc.tags, CollectionKind::Tags)?,
        trash: parse_items(&doc.trash, CollectionKind::Trash)?,
    })
}

fn parse_items<T: DeserializeOwned>(
    values: &[Value],
    kind: CollectionKind,
) -> Result<Vec<T>, BootstrapError> {
    values
        .iter()
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|e| {
                BootstrapError::MigrationError(format!(
                    "malformed {} item in legacy document: {}",
                    kind.as_str(),
                    e
                ))
            })
        })
        .collect()
}

/// Reads all four per-item collections into a typed snapshot.
fn read_remote_snapshot(
    uid: &str,
    remote: &dyn RemoteStore,
) -> Result<StateSnapshot, BootstrapError> {
    Ok(StateSnapshot {
        bookmarks: parse_remote(remote.read_collection(uid, CollectionKind::Bookmarks)?)?,
        folders: parse_remote(remote.read_collection(uid, CollectionKind::Folders)?)?,
        tags: parse_remote(remote.read_collection(uid, CollectionKind::Tags)?)?,
        trash: parse_remote(remote.read_collection(uid, CollectionKind::Trash)?)?,
    })
}

fn parse_remote<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>, BootstrapError> {
    values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| SyncError::SerializationError(e.to_string()).into())
        })
        .collect()
}
