//! Shared hand-off buffer between the capture producer and the app.
//!
//! The extension writes capture events and update patches into this area;
//! the bridge relay drains it. Delivery is at-least-once: the relay copies
//! the buffer before clearing it, so a crash in between can duplicate, and
//! the downstream merge must stay idempotent by natural key.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::capture::{CaptureEvent, UpdatePatch};
use crate::types::errors::HandoffError;

/// On-disk shape of the hand-off area: both buffer kinds in one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandoffBuffer {
    #[serde(default)]
    pub events: Vec<CaptureEvent>,
    #[serde(default)]
    pub patches: Vec<UpdatePatch>,
}

/// Trait defining hand-off buffer access.
///
/// Injected into the capture queue and bridge relay so tests can use an
/// in-memory double.
pub trait HandoffStore {
    fn load_events(&self) -> Result<Vec<CaptureEvent>, HandoffError>;
    fn store_events(&self, events: &[CaptureEvent]) -> Result<(), HandoffError>;
    fn load_patches(&self) -> Result<Vec<UpdatePatch>, HandoffError>;
    fn store_patches(&self, patches: &[UpdatePatch]) -> Result<(), HandoffError>;
}

/// Hand-off store persisted as a JSON file in a location both the capture
/// producer and the application can reach.
pub struct FileHandoffStore {
    path: PathBuf,
}

impl FileHandoffStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Result<HandoffBuffer, HandoffError> {
        if !self.path.exists() {
            return Ok(HandoffBuffer::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| HandoffError::IoError(format!("Failed to read buffer file: {}", e)))?;
        serde_json::from_str(&content).map_err(|e| {
            HandoffError::SerializationError(format!("Failed to parse buffer file: {}", e))
        })
    }

    fn save(&self, buffer: &HandoffBuffer) -> Result<(), HandoffError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                HandoffError::IoError(format!("Failed to create buffer directory: {}", e))
            })?;
        }
        let content = serde_json::to_string_pretty(buffer).map_err(|e| {
            HandoffError::SerializationError(format!("Failed to serialize buffer: {}", e))
        })?;
        fs::write(&self.path, content)
            .map_err(|e| HandoffError::IoError(format!("Failed to write buffer file: {}", e)))
    }
}

impl HandoffStore for FileHandoffStore {
    fn load_events(&self) -> Result<Vec<CaptureEvent>, HandoffError> {
        Ok(self.load()?.events)
    }

    fn store_events(&self, events: &[CaptureEvent]) -> Result<(), HandoffError> {
        let mut buffer = self.load()?;
        buffer.events = events.to_vec();
        self.save(&buffer)
    }

    fn load_patches(&self) -> Result<Vec<UpdatePatch>, HandoffError> {
        Ok(self.load()?.patches)
    }

    fn store_patches(&self, patches: &[UpdatePatch]) -> Result<(), HandoffError> {
        let mut buffer = self.load()?;
        buffer.patches = patches.to_vec();
        self.save(&buffer)
    }
}

/// In-memory hand-off store for tests and the demo binary.
#[derive(Default)]
pub struct MemoryHandoffStore {
    buffer: RefCell<HandoffBuffer>,
}

impl MemoryHandoffStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HandoffStore for MemoryHandoffStore {
    fn load_events(&self) -> Result<Vec<CaptureEvent>, HandoffError> {
        Ok(self.buffer.borrow().events.clone())
    }

    fn store_events(&self, events: &[CaptureEvent]) -> Result<(), HandoffError> {
        self.buffer.borrow_mut().events = events.to_vec();
        Ok(())
    }

    fn load_patches(&self) -> Result<Vec<UpdatePatch>, HandoffError> {
        Ok(self.buffer.borrow().patches.clone())
    }

    fn store_patches(&self, patches: &[UpdatePatch]) -> Result<(), HandoffError> {
        self.buffer.borrow_mut().patches = patches.to_vec();
        Ok(())
    }
}
