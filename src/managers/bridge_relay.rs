//! Consumer-side relay between the hand-off buffer and the app inbox.
//!
//! Each tick the relay moves whatever the capture producer buffered into
//! the in-process pending inbox and clears the buffer. The copy happens
//! before the clear, so a crash in between re-delivers rather than loses;
//! the reconciler's natural-key dedup absorbs the duplicates.

use tracing::debug;

use crate::services::handoff::HandoffStore;
use crate::types::capture::{CaptureEvent, UpdatePatch};
use crate::types::errors::HandoffError;

/// Captures and patches waiting to be merged into the library.
#[derive(Debug, Default)]
pub struct PendingInbox {
    pub imports: Vec<CaptureEvent>,
    pub updates: Vec<UpdatePatch>,
}

impl PendingInbox {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.updates.is_empty()
    }
}

/// Moves buffered captures and patches into `inbox`, clearing the buffer.
/// Returns true when anything arrived.
pub fn relay(handoff: &dyn HandoffStore, inbox: &mut PendingInbox) -> Result<bool, HandoffError> {
    let events = handoff.load_events()?;
    let patches = handoff.load_patches()?;
    let changed = !events.is_empty() || !patches.is_empty();
    if !events.is_empty() {
        debug!(count = events.len(), "captures relayed from hand-off buffer");
        inbox.imports.extend(events);
        handoff.store_events(&[])?;
    }
    if !patches.is_empty() {
        debug!(count = patches.len(), "patches relayed from hand-off buffer");
        inbox.updates.extend(patches);
        handoff.store_patches(&[])?;
    }
    Ok(changed)
}
