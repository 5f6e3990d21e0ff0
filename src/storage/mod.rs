//! Storage Layer - SQLite engine plus durable image persistence
//!
//! The session database is SQLite held in memory with tables:
//! - books(id, title, author, isbn, cover_url, description)
//! - friends(id, name)
//! - exchanges(id, book_id, friend_id, book_title, status, created_at)
//!
//! Its serialized image is the unit of persistence, import and export.

pub mod schema;
pub mod engine;
pub mod store;

pub use engine::{Engine, Row};
pub use store::{DurableStore, FileStore, MemoryStore, STORE_KEY};
