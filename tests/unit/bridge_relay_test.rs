//! Unit tests for the hand-off relay.

use bookmarkbase::managers::bridge_relay::{relay, PendingInbox};
use bookmarkbase::services::handoff::{HandoffStore, MemoryHandoffStore};
use bookmarkbase::types::capture::{CaptureEvent, UpdatePatch};

fn capture(natural_key: &str) -> CaptureEvent {
    CaptureEvent {
        id: String::new(),
        natural_key: natural_key.to_string(),
        url: format!("https://x.com/u/status/{}", natural_key),
        folder: String::new(),
        tags: Vec::new(),
        note: String::new(),
        saved_at: 0,
        author_name: String::new(),
        author_handle: String::new(),
        author_pic: String::new(),
        post_text: String::new(),
        media_urls: Vec::new(),
        media_type: String::new(),
        poster_url: String::new(),
    }
}

fn patch(natural_key: &str) -> UpdatePatch {
    UpdatePatch {
        natural_key: natural_key.to_string(),
        folder: String::new(),
        tags: Vec::new(),
        note: String::new(),
    }
}

#[test]
fn test_relay_empty_buffer_reports_no_change() {
    let handoff = MemoryHandoffStore::new();
    let mut inbox = PendingInbox::default();

    assert!(!relay(&handoff, &mut inbox).unwrap());
    assert!(inbox.is_empty());
}

/// Buffered events and patches move into the inbox and the buffer is
/// cleared behind them.
#[test]
fn test_relay_moves_and_clears() {
    let handoff = MemoryHandoffStore::new();
    handoff
        .store_events(&[capture("111"), capture("222")])
        .unwrap();
    handoff.store_patches(&[patch("333")]).unwrap();

    let mut inbox = PendingInbox::default();
    assert!(relay(&handoff, &mut inbox).unwrap());

    assert_eq!(inbox.imports.len(), 2);
    assert_eq!(inbox.updates.len(), 1);
    assert!(handoff.load_events().unwrap().is_empty());
    assert!(handoff.load_patches().unwrap().is_empty());
}

/// A relay into a non-empty inbox accumulates instead of overwriting.
#[test]
fn test_relay_accumulates_into_inbox() {
    let handoff = MemoryHandoffStore::new();
    let mut inbox = PendingInbox::default();

    handoff.store_events(&[capture("111")]).unwrap();
    relay(&handoff, &mut inbox).unwrap();

    handoff.store_events(&[capture("222")]).unwrap();
    relay(&handoff, &mut inbox).unwrap();

    assert_eq!(inbox.imports.len(), 2);
    assert_eq!(inbox.imports[0].natural_key, "111");
    assert_eq!(inbox.imports[1].natural_key, "222");
}
