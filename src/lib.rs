//! # Biblipartage - personal library tracker
//!
//! Catalog books, record friends and track the books lent to them.
//!
//! Biblipartage provides:
//! - A session-owned SQLite database kept entirely in memory
//! - Write-through persistence of the full database image after every change
//! - Typed book/friend/loan operations that report rule violations as values
//! - Import and export of the whole library as a portable SQLite file
//! - ISBN metadata lookup against public catalogs with graceful fallback

pub mod model;
pub mod rejection;
pub mod storage;
pub mod library;
pub mod lookup;
pub mod seed;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use model::{Book, Exchange, Friend, LibraryStats, LoanDetail, NewBook};
pub use rejection::{Outcome, Rejection, RejectionCode};
pub use storage::{DurableStore, Engine, FileStore, MemoryStore};
pub use library::Library;
pub use lookup::{BookMetadata, IsbnLookup};

/// Result type alias for Biblipartage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure faults.
///
/// Business-rule failures never appear here; they are reported as
/// [`Rejection`] values inside an [`Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Lookup error: {0}")]
    Lookup(String),
}
