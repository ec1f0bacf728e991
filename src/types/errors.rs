use std::fmt;

// === StoreError ===

/// Errors related to the local SQLite cache.
#[derive(Debug)]
pub enum StoreError {
    /// Database operation failed.
    DatabaseError(String),
    /// A persisted payload could not be serialized or deserialized.
    SerializationError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DatabaseError(msg) => write!(f, "Local store database error: {}", msg),
            StoreError::SerializationError(msg) => {
                write!(f, "Local store serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StoreError {}

// === CaptureError ===

/// Errors related to the capture queue.
#[derive(Debug)]
pub enum CaptureError {
    /// The capture payload failed the required-field check.
    Validation(String),
    /// The hand-off buffer could not be read or written.
    Storage(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Validation(msg) => write!(f, "Invalid capture payload: {}", msg),
            CaptureError::Storage(msg) => write!(f, "Capture hand-off storage error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

// === HandoffError ===

/// Errors related to the shared hand-off buffer.
#[derive(Debug)]
pub enum HandoffError {
    /// An I/O error occurred while reading or writing the buffer.
    IoError(String),
    /// The buffer contents could not be serialized or deserialized.
    SerializationError(String),
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffError::IoError(msg) => write!(f, "Hand-off buffer I/O error: {}", msg),
            HandoffError::SerializationError(msg) => {
                write!(f, "Hand-off buffer serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for HandoffError {}

// === LibraryError ===

/// Errors related to canonical collection intents.
#[derive(Debug)]
pub enum LibraryError {
    /// Bookmark, folder or tag with the given ID was not found.
    NotFound(String),
    /// A folder or tag with the same case-insensitive name already exists.
    DuplicateName(String),
    /// A bookmark with the same natural key already exists.
    DuplicateNaturalKey(String),
    /// Reparenting would make the folder its own ancestor.
    FolderCycle(String),
    /// Malformed payload: array-shape or required-field check failed.
    ValidationError(String),
    /// The projected archive size would exceed the soft local limit.
    QuotaError(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::NotFound(id) => write!(f, "Item not found: {}", id),
            LibraryError::DuplicateName(name) => write!(f, "Name already exists: {}", name),
            LibraryError::DuplicateNaturalKey(key) => {
                write!(f, "Bookmark already captured: {}", key)
            }
            LibraryError::FolderCycle(id) => {
                write!(f, "Folder move rejected, would create a cycle: {}", id)
            }
            LibraryError::ValidationError(msg) => write!(f, "Invalid payload: {}", msg),
            LibraryError::QuotaError(msg) => write!(f, "Storage quota exceeded: {}", msg),
        }
    }
}

impl std::error::Error for LibraryError {}

// === SyncError ===

/// Errors related to the remote sync engine.
#[derive(Debug)]
pub enum SyncError {
    /// Remote store unreachable or a write was rejected.
    NetworkError(String),
    /// A remote document could not be serialized or deserialized.
    SerializationError(String),
    /// The local sync-metadata record could not be updated.
    DatabaseError(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NetworkError(msg) => write!(f, "Sync network error: {}", msg),
            SyncError::SerializationError(msg) => {
                write!(f, "Sync serialization error: {}", msg)
            }
            SyncError::DatabaseError(msg) => write!(f, "Sync metadata error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// === BootstrapError ===

/// Errors related to session bootstrap and legacy-schema migration.
#[derive(Debug)]
pub enum BootstrapError {
    /// Legacy blob present but malformed; migration halted, retried next load.
    MigrationError(String),
    /// Remote metadata or collections could not be read.
    NetworkError(String),
    /// Local sync state could not be read or written.
    DatabaseError(String),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::MigrationError(msg) => write!(f, "Migration failed: {}", msg),
            BootstrapError::NetworkError(msg) => write!(f, "Bootstrap network error: {}", msg),
            BootstrapError::DatabaseError(msg) => write!(f, "Bootstrap database error: {}", msg),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<SyncError> for BootstrapError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NetworkError(msg) => BootstrapError::NetworkError(msg),
            SyncError::SerializationError(msg) => BootstrapError::NetworkError(msg),
            SyncError::DatabaseError(msg) => BootstrapError::DatabaseError(msg),
        }
    }
}

impl From<StoreError> for BootstrapError {
    fn from(err: StoreError) -> Self {
        BootstrapError::DatabaseError(err.to_string())
    }
}
