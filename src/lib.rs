//! Bookmark Base core library.
//!
//! Local-first bookmark organizer for social-media posts: captures arrive
//! through a shared hand-off buffer, live in a SQLite cache, and replicate
//! to a per-user remote document store with diff-based, debounced sync.
//!
//! # Architecture
//!
//! - [`types`]: domain items, capture payloads, sync wire types, errors
//! - [`database`]: SQLite cache, migrations, collection persistence
//! - [`managers`]: canonical library, capture queue, relay, reconciler
//! - [`services`]: hand-off storage, remote store, debouncer, sync engine,
//!   first-contact bootstrap
//! - [`app`]: the orchestrator tying it all together on one thread

pub mod app;
pub mod database;
pub mod managers;
pub mod services;
pub mod types;

pub use app::App;
