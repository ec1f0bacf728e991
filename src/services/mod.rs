// Bookmark Base services
// Services cover the synchronization machinery: hand-off storage, the
// remote document store, debouncing, the diff/sync engine, and bootstrap.

pub mod bootstrap;
pub mod debouncer;
pub mod handoff;
pub mod remote_store;
pub mod sync_engine;
