//! Merges pending captures and patches into the canonical library.
//!
//! The merge is idempotent by natural key: delivering the same capture
//! twice (the hand-off buffer is at-least-once) inserts one bookmark, and
//! re-applying a patch converges to the same state.

use tracing::debug;

use crate::managers::bridge_relay::PendingInbox;
use crate::managers::library::Library;
use crate::types::bookmark::BookmarkItem;
use crate::types::capture::{CaptureEvent, UpdatePatch};

/// What one reconcile pass changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub tags_created: usize,
    /// Patches whose target bookmark does not exist (deleted between the
    /// capture and the patch). Dropped, not retried.
    pub unmatched: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.inserted > 0 || self.updated > 0 || self.tags_created > 0
    }
}

/// Drains the inbox into the library. Imports merge before updates, so a
/// patch for a capture delivered in the same tick finds its bookmark.
pub fn reconcile(library: &mut Library, inbox: &mut PendingInbox) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    merge_pending_imports(library, std::mem::take(&mut inbox.imports), &mut outcome);
    merge_pending_updates(library, std::mem::take(&mut inbox.updates), &mut outcome);
    outcome
}

/// Inserts captured bookmarks, skipping any natural key already present in
/// the library or earlier in the batch. The surviving block is prepended in
/// capture order.
fn merge_pending_imports(
    library: &mut Library,
    imports: Vec<CaptureEvent>,
    outcome: &mut MergeOutcome,
) {
    let mut fresh = Vec::new();
    for event in imports {
        if library.find_by_natural_key(&event.natural_key).is_some() {
            debug!(natural_key = %event.natural_key, "import skipped, already saved");
            continue;
        }
        let bookmark = event.into_bookmark();
        if fresh
            .iter()
            .any(|b: &BookmarkItem| b.natural_key == bookmark.natural_key)
        {
            continue;
        }
        for tag in &bookmark.tags {
            if library.ensure_tag(tag) {
                outcome.tags_created += 1;
            }
        }
        fresh.push(bookmark);
    }
    outcome.inserted = fresh.len();
    if !fresh.is_empty() {
        library.prepend_bookmarks(fresh);
    }
}

/// Applies folder/tags/note patches to bookmarks matched by natural key.
/// Only the patched fields are overwritten; capture metadata is untouched.
fn merge_pending_updates(
    library: &mut Library,
    updates: Vec<UpdatePatch>,
    outcome: &mut MergeOutcome,
) {
    for patch in updates {
        if library.find_by_natural_key(&patch.natural_key).is_none() {
            debug!(natural_key = %patch.natural_key, "patch dropped, no matching bookmark");
            outcome.unmatched += 1;
            continue;
        }
        let tags: Vec<String> = patch
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        for tag in &tags {
            if library.ensure_tag(tag) {
                outcome.tags_created += 1;
            }
        }
        if let Some(bookmark) = library.find_by_natural_key_mut(&patch.natural_key) {
            if !patch.folder.trim().is_empty() {
                bookmark.folder = patch.folder;
            }
            bookmark.tags = tags;
            bookmark.description = patch.note;
            outcome.updated += 1;
        }
    }
}
