//! Unit tests for the error types.
//!
//! Verifies Display formatting carries the underlying message and that
//! cross-domain conversions map onto the right variants.

use bookmarkbase::types::errors::{
    BootstrapError, CaptureError, HandoffError, LibraryError, StoreError, SyncError,
};

#[test]
fn test_store_error_display_includes_message() {
    let err = StoreError::DatabaseError("disk full".to_string());
    assert!(err.to_string().contains("disk full"));

    let err = StoreError::SerializationError("bad payload".to_string());
    assert!(err.to_string().contains("bad payload"));
}

#[test]
fn test_capture_error_display() {
    let err = CaptureError::Validation("missing a natural key".to_string());
    assert!(err.to_string().contains("missing a natural key"));

    let err = CaptureError::Storage("buffer write failed".to_string());
    assert!(err.to_string().contains("buffer write failed"));
}

#[test]
fn test_handoff_error_display() {
    let err = HandoffError::IoError("permission denied".to_string());
    assert!(err.to_string().contains("permission denied"));
}

#[test]
fn test_library_error_display() {
    let err = LibraryError::NotFound("abc".to_string());
    assert!(err.to_string().contains("abc"));

    let err = LibraryError::DuplicateNaturalKey("12345".to_string());
    assert!(err.to_string().contains("12345"));

    let err = LibraryError::FolderCycle("folder-1".to_string());
    assert!(err.to_string().contains("cycle"));

    let err = LibraryError::QuotaError("too big".to_string());
    assert!(err.to_string().contains("too big"));
}

#[test]
fn test_sync_error_display() {
    let err = SyncError::NetworkError("timeout".to_string());
    assert!(err.to_string().contains("timeout"));
}

/// Sync failures during bootstrap surface as bootstrap errors with the
/// network/database split preserved.
#[test]
fn test_bootstrap_error_from_sync_error() {
    let err: BootstrapError = SyncError::NetworkError("offline".to_string()).into();
    assert!(matches!(err, BootstrapError::NetworkError(_)));

    let err: BootstrapError = SyncError::DatabaseError("locked".to_string()).into();
    assert!(matches!(err, BootstrapError::DatabaseError(_)));
}

#[test]
fn test_bootstrap_error_from_store_error() {
    let err: BootstrapError = StoreError::DatabaseError("locked".to_string()).into();
    assert!(matches!(err, BootstrapError::DatabaseError(_)));
}

/// All error enums implement std::error::Error so they box cleanly.
#[test]
fn test_errors_are_std_error() {
    fn assert_error<E: std::error::Error>(_e: E) {}
    assert_error(StoreError::DatabaseError(String::new()));
    assert_error(CaptureError::Validation(String::new()));
    assert_error(HandoffError::IoError(String::new()));
    assert_error(LibraryError::NotFound(String::new()));
    assert_error(SyncError::NetworkError(String::new()));
    assert_error(BootstrapError::MigrationError(String::new()));
}
