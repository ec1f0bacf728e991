//! Demo walkthrough of the Bookmark Base core.
//!
//! Simulates the full pipeline with in-memory stores and virtual time:
//! captures land in the hand-off buffer, the app relays and merges them,
//! the debounced flush persists and syncs, and a second device pulls the
//! same state down from the shared remote.

use std::sync::Arc;

use bookmarkbase::app::App;
use bookmarkbase::database::Database;
use bookmarkbase::managers::capture_queue::CaptureQueue;
use bookmarkbase::services::handoff::{HandoffStore, MemoryHandoffStore};
use bookmarkbase::services::remote_store::{MemoryRemoteStore, RemoteStore};
use bookmarkbase::types::capture::CaptureEvent;
use bookmarkbase::types::config::SyncConfig;

fn sample_capture(natural_key: &str, url: &str, text: &str) -> CaptureEvent {
    CaptureEvent {
        id: String::new(),
        natural_key: natural_key.to_string(),
        url: url.to_string(),
        folder: String::new(),
        tags: vec!["Rust".to_string()],
        note: String::new(),
        saved_at: 0,
        author_name: "Demo Author".to_string(),
        author_handle: "@demo".to_string(),
        author_pic: String::new(),
        post_text: text.to_string(),
        media_urls: Vec::new(),
        media_type: String::new(),
        poster_url: String::new(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Bookmark Base Demo ===\n");

    let config = SyncConfig::default();
    let handoff = Arc::new(MemoryHandoffStore::new());
    let remote = Arc::new(MemoryRemoteStore::new());

    let db = Arc::new(Database::open_in_memory()?);
    let mut app = App::new(
        db,
        handoff.clone() as Arc<dyn HandoffStore>,
        remote.clone() as Arc<dyn RemoteStore>,
        config.clone(),
    );
    app.startup(0)?;

    println!("--- Capture ---");
    let mut queue = CaptureQueue::new();
    queue.enqueue(
        sample_capture(
            "1234567890",
            "https://x.com/demo/status/1234567890",
            "Borrow checker appreciation post",
        ),
        handoff.as_ref(),
    )?;
    queue.enqueue(
        sample_capture(
            "abc123",
            "https://www.reddit.com/r/rust/comments/abc123/why_ownership/",
            "Why ownership matters",
        ),
        handoff.as_ref(),
    )?;
    println!("2 captures written to the hand-off buffer");

    app.tick_at(100);
    println!("library now holds {} bookmarks\n", app.library().bookmarks().len());

    println!("--- Sign-in and sync ---");
    remote.set_server_time(1_000);
    app.set_identity("demo-user");
    app.tick_at(200);
    app.save_now(300)?;
    println!(
        "remote bookmark documents: {}\n",
        remote.collection_len("demo-user", bookmarkbase::types::sync::CollectionKind::Bookmarks)
    );

    println!("--- Second device ---");
    let db2 = Arc::new(Database::open_in_memory()?);
    let handoff2 = Arc::new(MemoryHandoffStore::new());
    let mut device2 = App::new(
        db2,
        handoff2 as Arc<dyn HandoffStore>,
        remote.clone() as Arc<dyn RemoteStore>,
        config,
    );
    device2.startup(10_000)?;
    device2.set_identity("demo-user");
    device2.tick_at(10_100);
    println!(
        "second device pulled {} bookmarks and {} tags",
        device2.library().bookmarks().len(),
        device2.library().tags().len()
    );

    println!("\n=== Demo complete ===");
    Ok(())
}
