//! Open Library catalog source
//!
//! Editions reference authors by key, so each author name costs one more
//! request. At most three authors are resolved.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{open_library_cover_url, unknown_title, BookMetadata, CatalogSource};
use crate::Result;

const MAX_AUTHORS: usize = 3;
const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Default, Deserialize)]
struct Edition {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<AuthorRef>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

pub struct OpenLibrary {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    author_timeout: Duration,
}

impl OpenLibrary {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        timeout: Duration,
        author_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            author_timeout,
        }
    }

    async fn author_name(&self, key: &str) -> Result<String> {
        let author: Author = self
            .client
            .get(format!("{}{}.json", self.base_url, key))
            .timeout(self.author_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(author.name.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()))
    }
}

#[async_trait]
impl CatalogSource for OpenLibrary {
    fn name(&self) -> &'static str {
        "open-library"
    }

    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>> {
        let edition: Edition = self
            .client
            .get(format!("{}/isbn/{}.json", self.base_url, isbn))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut names = Vec::new();
        for author in author_keys(&edition) {
            match self.author_name(author).await {
                Ok(name) => names.push(name),
                Err(e) => {
                    debug!(key = author, error = %e, "author lookup failed");
                    names.push(UNKNOWN_AUTHOR.to_string());
                }
            }
        }

        Ok(Some(metadata_from_edition(isbn, edition, names)))
    }
}

fn author_keys(edition: &Edition) -> impl Iterator<Item = &str> {
    edition
        .authors
        .iter()
        .take(MAX_AUTHORS)
        .map(|author| author.key.as_str())
}

fn metadata_from_edition(isbn: &str, edition: Edition, author_names: Vec<String>) -> BookMetadata {
    BookMetadata {
        title: edition.title.unwrap_or_else(|| unknown_title(isbn)),
        author: author_names.join(", "),
        isbn: isbn.to_string(),
        cover_url: open_library_cover_url(isbn),
        description: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_keys_capped() {
        let edition: Edition = serde_json::from_str(
            r#"{
                "title": "Good Omens",
                "authors": [
                    {"key": "/authors/OL1A"},
                    {"key": "/authors/OL2A"},
                    {"key": "/authors/OL3A"},
                    {"key": "/authors/OL4A"}
                ]
            }"#,
        )
        .unwrap();

        let keys: Vec<_> = author_keys(&edition).collect();
        assert_eq!(keys, vec!["/authors/OL1A", "/authors/OL2A", "/authors/OL3A"]);
    }

    #[test]
    fn test_metadata_from_edition() {
        let edition: Edition = serde_json::from_str(r#"{"title": "Dune"}"#).unwrap();
        let meta = metadata_from_edition(
            "9780441013593",
            edition,
            vec!["Frank Herbert".to_string(), UNKNOWN_AUTHOR.to_string()],
        );

        assert_eq!(meta.title, "Dune");
        assert_eq!(meta.author, "Frank Herbert, Unknown");
        assert_eq!(meta.cover_url, "https://covers.openlibrary.org/b/isbn/9780441013593-L.jpg");
        assert!(meta.description.is_empty());
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let meta = metadata_from_edition("77", Edition::default(), Vec::new());
        assert_eq!(meta.title, "Unknown book (77)");
        assert_eq!(meta.author, "");
    }
}
