//! ISBN metadata lookup
//!
//! Sources are tried in order; the first one that knows the ISBN wins.
//! Failures are logged and absorbed. When every source comes up empty a
//! minimal record is synthesized, so a lookup always yields metadata.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BiblioConfig;
use crate::model::NewBook;
use crate::Result;

pub mod google;
pub mod open_library;

pub use google::GoogleBooks;
pub use open_library::OpenLibrary;

/// Book metadata as returned by a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub cover_url: String,
    pub description: String,
}

impl BookMetadata {
    /// Placeholder record used when no catalog knows the ISBN
    pub fn synthesized(isbn: &str) -> Self {
        Self {
            title: format!("Book {}", isbn),
            author: String::new(),
            isbn: isbn.to_string(),
            cover_url: open_library_cover_url(isbn),
            description: String::new(),
        }
    }
}

impl From<BookMetadata> for NewBook {
    fn from(meta: BookMetadata) -> Self {
        NewBook {
            title: meta.title,
            author: Some(meta.author),
            isbn: Some(meta.isbn),
            cover_url: Some(meta.cover_url),
            description: Some(meta.description),
        }
    }
}

/// Large cover image served by Open Library for any ISBN
pub fn open_library_cover_url(isbn: &str) -> String {
    format!("https://covers.openlibrary.org/b/isbn/{}-L.jpg", isbn)
}

/// Title used when a catalog matches the ISBN but has no title
pub(crate) fn unknown_title(isbn: &str) -> String {
    format!("Unknown book ({})", isbn)
}

/// A catalog that can resolve an ISBN to metadata
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the catalog has no entry for the ISBN
    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>>;
}

/// Cascading lookup over several catalogs
pub struct IsbnLookup {
    sources: Vec<Box<dyn CatalogSource>>,
}

impl IsbnLookup {
    pub fn new(sources: Vec<Box<dyn CatalogSource>>) -> Self {
        Self { sources }
    }

    /// Google Books first, then Open Library, as configured
    pub fn from_config(config: &BiblioConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.lookup_timeout_secs))
            .user_agent(concat!("biblipartage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let google = GoogleBooks::new(
            client.clone(),
            &config.google_books_url,
            Duration::from_secs(config.lookup_timeout_secs),
        );
        let open_library = OpenLibrary::new(
            client,
            &config.open_library_url,
            Duration::from_secs(config.lookup_timeout_secs),
            Duration::from_secs(config.author_timeout_secs),
        );

        Ok(Self::new(vec![Box::new(google), Box::new(open_library)]))
    }

    /// Resolve an ISBN. Never fails.
    pub async fn fetch(&self, isbn: &str) -> BookMetadata {
        let isbn = isbn.trim();
        for source in &self.sources {
            match source.lookup(isbn).await {
                Ok(Some(meta)) => {
                    debug!(source = source.name(), isbn, "catalog match");
                    return meta;
                }
                Ok(None) => debug!(source = source.name(), isbn, "no catalog entry"),
                Err(e) => warn!(source = source.name(), isbn, error = %e, "catalog lookup failed, trying next source"),
            }
        }

        debug!(isbn, "falling back to synthesized metadata");
        BookMetadata::synthesized(isbn)
    }
}
