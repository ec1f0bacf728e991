//! Producer-side capture queue.
//!
//! Sits between the capture UI and the hand-off buffer. Saves are queued
//! and written one at a time behind a draining flag, so a burst of capture
//! clicks cannot interleave buffer writes; duplicates are dropped against
//! what is already buffered, keyed by natural key.

use std::collections::VecDeque;

use tracing::debug;

use crate::services::handoff::HandoffStore;
use crate::types::bookmark::natural_key_from_url;
use crate::types::capture::{CaptureEvent, UpdatePatch};
use crate::types::errors::CaptureError;

#[derive(Default)]
pub struct CaptureQueue {
    queue: VecDeque<CaptureEvent>,
    draining: bool,
}

impl CaptureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Validates and queues a capture, then drains the queue into the
    /// hand-off buffer. A missing natural key is derived from the post URL
    /// when the URL carries one.
    pub fn enqueue(
        &mut self,
        mut event: CaptureEvent,
        handoff: &dyn HandoffStore,
    ) -> Result<usize, CaptureError> {
        if event.natural_key.trim().is_empty() {
            if let Some(key) = natural_key_from_url(&event.url) {
                event.natural_key = key;
            }
        }
        event.validate()?;
        self.queue.push_back(event);
        self.drain(handoff)
    }

    /// Writes queued captures into the hand-off buffer, one per cycle.
    ///
    /// Re-entrant calls while a drain runs return immediately; the active
    /// drain picks their events up. Returns how many events were appended.
    pub fn drain(&mut self, handoff: &dyn HandoffStore) -> Result<usize, CaptureError> {
        if self.draining {
            return Ok(0);
        }
        self.draining = true;
        let result = self.drain_inner(handoff);
        self.draining = false;
        result
    }

    fn drain_inner(&mut self, handoff: &dyn HandoffStore) -> Result<usize, CaptureError> {
        let mut appended = 0;
        while let Some(event) = self.queue.pop_front() {
            // Re-load each cycle: the consumer may have drained the buffer
            // between writes.
            let mut buffered = handoff
                .load_events()
                .map_err(|e| CaptureError::Storage(e.to_string()))?;
            if buffered
                .iter()
                .any(|e| e.natural_key == event.natural_key)
            {
                debug!(natural_key = %event.natural_key, "duplicate capture dropped");
                continue;
            }
            buffered.push(event);
            handoff
                .store_events(&buffered)
                .map_err(|e| CaptureError::Storage(e.to_string()))?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Buffers a folder/tags/note change made from the capture UI.
    ///
    /// If the target capture is still sitting unconsumed in the buffer the
    /// patch is folded into it, so the consumer sees one already-correct
    /// event. Otherwise the patch lands in the update buffer for the
    /// reconciler to match by natural key.
    pub fn enqueue_update(
        &mut self,
        patch: UpdatePatch,
        handoff: &dyn HandoffStore,
    ) -> Result<(), CaptureError> {
        patch.validate()?;
        let mut buffered = handoff
            .load_events()
            .map_err(|e| CaptureError::Storage(e.to_string()))?;
        if let Some(event) = buffered
            .iter_mut()
            .find(|e| e.natural_key == patch.natural_key)
        {
            if !patch.folder.trim().is_empty() {
                event.folder = patch.folder;
            }
            event.tags = patch.tags;
            event.note = patch.note;
            return handoff
                .store_events(&buffered)
                .map_err(|e| CaptureError::Storage(e.to_string()));
        }
        let mut patches = handoff
            .load_patches()
            .map_err(|e| CaptureError::Storage(e.to_string()))?;
        // A newer patch for the same post replaces the older one.
        patches.retain(|p| p.natural_key != patch.natural_key);
        patches.push(patch);
        handoff
            .store_patches(&patches)
            .map_err(|e| CaptureError::Storage(e.to_string()))
    }
}
