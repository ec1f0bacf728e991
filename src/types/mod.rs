// Bookmark Base shared type definitions
// Each submodule defines types used across the application.

pub mod bookmark;
pub mod capture;
pub mod config;
pub mod errors;
pub mod sync;
