//! Application orchestrator.
//!
//! Owns the canonical library and wires the capture inbox, local cache,
//! debouncer and sync engine together. Everything runs on one thread; the
//! host calls [`App::tick_at`] periodically with the current time and the
//! app performs whatever became due. Mutation intents go through the app
//! so every change marks the debouncer dirty.

use std::sync::Arc;

use tracing::{info, warn};

use crate::database::{CollectionStore, Database};
use crate::managers::bridge_relay::{self, PendingInbox};
use crate::managers::library::Library;
use crate::managers::reconciler;
use crate::services::bootstrap::{BootstrapLoader, BootstrapOutcome};
use crate::services::debouncer::{ChangeDebouncer, CloudUpdateGuard};
use crate::services::handoff::HandoffStore;
use crate::services::remote_store::RemoteStore;
use crate::services::sync_engine::SyncEngine;
use crate::types::bookmark::BookmarkItem;
use crate::types::config::SyncConfig;
use crate::types::errors::{LibraryError, StoreError, SyncError};

/// Main application state.
pub struct App {
    db: Arc<Database>,
    config: SyncConfig,
    library: Library,
    inbox: PendingInbox,
    engine: SyncEngine,
    debouncer: ChangeDebouncer,
    guard: CloudUpdateGuard,
    bootstrap: BootstrapLoader,
    handoff: Arc<dyn HandoffStore>,
    remote: Arc<dyn RemoteStore>,
    identity: Option<String>,
}

impl App {
    pub fn new(
        db: Arc<Database>,
        handoff: Arc<dyn HandoffStore>,
        remote: Arc<dyn RemoteStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            engine: SyncEngine::new(config.batch_flush_threshold),
            debouncer: ChangeDebouncer::new(config.debounce_ms),
            guard: CloudUpdateGuard::new(),
            bootstrap: BootstrapLoader::new(),
            library: Library::new(),
            inbox: PendingInbox::default(),
            identity: None,
            db,
            handoff,
            remote,
            config,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Loads the cached state and sweeps expired trash.
    pub fn startup(&mut self, now_ms: i64) -> Result<(), StoreError> {
        let store = CollectionStore::new(self.db.connection());
        let snapshot = store.load_snapshot()?;
        info!(
            bookmarks = snapshot.bookmarks.len(),
            folders = snapshot.folders.len(),
            tags = snapshot.tags.len(),
            trash = snapshot.trash.len(),
            "local cache loaded"
        );
        self.library.replace_from_snapshot(snapshot);
        let purged = self
            .library
            .purge_expired(now_ms, self.config.trash_retention_days);
        if purged > 0 {
            self.debouncer.note_mutation(now_ms);
        }
        Ok(())
    }

    /// Signs an identity in. The first-contact decision runs on the next
    /// tick, not here.
    pub fn set_identity(&mut self, uid: &str) {
        self.identity = Some(uid.to_string());
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Signs out: forgets the identity, the diff baseline and the loaded
    /// marker, so the next sign-in bootstraps from scratch.
    pub fn sign_out(&mut self) {
        self.identity = None;
        self.bootstrap.reset();
        self.engine.clear_baseline();
        self.guard.clear();
    }

    /// One cooperative cycle: relay captures, reconcile them, run the
    /// first-contact decision if pending, and fire the debounced flush.
    ///
    /// Background failures are logged here and retried on a later tick;
    /// only [`App::save_now`] surfaces errors to the caller.
    pub fn tick_at(&mut self, now_ms: i64) {
        match bridge_relay::relay(self.handoff.as_ref(), &mut self.inbox) {
            Ok(_) => {}
            Err(err) => warn!(error = %err, "hand-off relay failed"),
        }

        if !self.inbox.is_empty() {
            let outcome = reconciler::reconcile(&mut self.library, &mut self.inbox);
            if outcome.changed() {
                info!(
                    inserted = outcome.inserted,
                    updated = outcome.updated,
                    tags_created = outcome.tags_created,
                    unmatched = outcome.unmatched,
                    "pending captures merged"
                );
                self.debouncer.note_mutation(now_ms);
            }
        }

        if let Some(uid) = self.identity.clone() {
            let store = CollectionStore::new(self.db.connection());
            match self.bootstrap.run(
                &uid,
                &mut self.library,
                &mut self.engine,
                self.remote.as_ref(),
                &store,
                &mut self.guard,
                &self.config,
                now_ms,
            ) {
                Ok(BootstrapOutcome::AlreadyLoaded) => {}
                Ok(BootstrapOutcome::Pulled) | Ok(BootstrapOutcome::Migrated) => {
                    self.debouncer.note_mutation(now_ms);
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "bootstrap failed"),
            }
        }

        if self.debouncer.poll(now_ms) {
            let store = CollectionStore::new(self.db.connection());
            let snapshot = self.library.snapshot();
            if let Err(err) = store.flush(&snapshot) {
                warn!(error = %err, "local flush failed");
            }
            if self.identity.is_some() && !self.guard.is_active(now_ms) {
                self.engine.request(false);
            }
        }

        if let Some(uid) = self.identity.clone() {
            if self.engine.has_pending() {
                let store = CollectionStore::new(self.db.connection());
                let snapshot = self.library.snapshot();
                if let Err(err) =
                    self.engine
                        .drain(&uid, &snapshot, self.remote.as_ref(), &store, now_ms)
                {
                    warn!(error = %err, "sync drain failed");
                }
            }
        }
    }

    /// User-initiated save: flushes the local cache immediately and forces
    /// a full sync pass, surfacing any failure.
    pub fn save_now(&mut self, now_ms: i64) -> Result<(), SyncError> {
        let store = CollectionStore::new(self.db.connection());
        let snapshot = self.library.snapshot();
        store
            .flush(&snapshot)
            .map_err(|e| SyncError::DatabaseError(e.to_string()))?;
        if let Some(uid) = self.identity.clone() {
            self.engine.request(true);
            self.engine
                .drain(&uid, &snapshot, self.remote.as_ref(), &store, now_ms)?;
        }
        Ok(())
    }

    // === Mutation intents ===
    // Thin wrappers over the library that mark the debouncer dirty.

    pub fn add_bookmark(&mut self, item: BookmarkItem, now_ms: i64) -> Result<(), LibraryError> {
        self.library.add_bookmark(item)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn edit_bookmark(
        &mut self,
        id: &str,
        folder: String,
        tags: Vec<String>,
        description: String,
        now_ms: i64,
    ) -> Result<(), LibraryError> {
        self.library.edit_bookmark(id, folder, tags, description)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn move_to_trash(&mut self, id: &str, now_ms: i64) -> Result<(), LibraryError> {
        self.library.move_to_trash(id, now_ms)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn restore(&mut self, id: &str, now_ms: i64) -> Result<(), LibraryError> {
        self.library.restore(id)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn purge(&mut self, id: &str, now_ms: i64) -> Result<(), LibraryError> {
        self.library.purge(id)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn clear_trash(&mut self, now_ms: i64) -> usize {
        let purged = self.library.clear_trash();
        if purged > 0 {
            self.debouncer.note_mutation(now_ms);
        }
        purged
    }

    pub fn create_folder(
        &mut self,
        name: &str,
        color: &str,
        parent_id: Option<String>,
        now_ms: i64,
    ) -> Result<String, LibraryError> {
        let id = self.library.create_folder(name, color, parent_id)?;
        self.debouncer.note_mutation(now_ms);
        Ok(id)
    }

    pub fn edit_folder(
        &mut self,
        id: &str,
        name: &str,
        color: &str,
        now_ms: i64,
    ) -> Result<(), LibraryError> {
        self.library.edit_folder(id, name, color)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn set_folder_parent(
        &mut self,
        id: &str,
        parent_id: Option<String>,
        now_ms: i64,
    ) -> Result<(), LibraryError> {
        self.library.set_folder_parent(id, parent_id)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn set_folder_pinned(
        &mut self,
        id: &str,
        pinned: bool,
        now_ms: i64,
    ) -> Result<(), LibraryError> {
        self.library.set_folder_pinned(id, pinned)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn delete_folder(&mut self, id: &str, now_ms: i64) -> Result<(), LibraryError> {
        self.library.delete_folder(id)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn create_tag(
        &mut self,
        name: &str,
        color: &str,
        now_ms: i64,
    ) -> Result<String, LibraryError> {
        let id = self.library.create_tag(name, color)?;
        self.debouncer.note_mutation(now_ms);
        Ok(id)
    }

    pub fn edit_tag(
        &mut self,
        id: &str,
        name: &str,
        color: &str,
        now_ms: i64,
    ) -> Result<(), LibraryError> {
        self.library.edit_tag(id, name, color)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn delete_tag(&mut self, id: &str, now_ms: i64) -> Result<(), LibraryError> {
        self.library.delete_tag(id)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    pub fn export_backup(&self, export_date: &str) -> Result<String, LibraryError> {
        self.library.export_backup(export_date)
    }

    /// Replaces the library from a backup archive and schedules a flush.
    pub fn import_backup(&mut self, json: &str, now_ms: i64) -> Result<(), LibraryError> {
        self.library.import_backup(json, &self.config)?;
        self.debouncer.note_mutation(now_ms);
        Ok(())
    }

    /// True while a debounced flush is pending.
    pub fn is_dirty(&self) -> bool {
        self.debouncer.is_dirty()
    }
}
