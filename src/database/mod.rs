//! Bookmark Base local cache layer.
//!
//! Provides SQLite connection management, schema migrations, and the
//! key-value collection tables the debouncer flushes into.

pub mod collections;
pub mod connection;
pub mod migrations;

pub use collections::CollectionStore;
pub use connection::Database;
