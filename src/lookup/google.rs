//! Google Books catalog source

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{open_library_cover_url, unknown_title, BookMetadata, CatalogSource};
use crate::Result;

/// Cover sizes from best to worst
const COVER_SIZES: &[&str] = &[
    "extraLarge",
    "large",
    "medium",
    "small",
    "thumbnail",
    "smallThumbnail",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: Option<String>,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    description: Option<String>,
    #[serde(default)]
    image_links: HashMap<String, String>,
}

pub struct GoogleBooks {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GoogleBooks {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl CatalogSource for GoogleBooks {
    fn name(&self) -> &'static str {
        "google-books"
    }

    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>> {
        let url = format!("{}/volumes?q=isbn:{}", self.base_url, isbn);
        let response: VolumesResponse = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(metadata_from_volumes(isbn, response))
    }
}

fn metadata_from_volumes(isbn: &str, response: VolumesResponse) -> Option<BookMetadata> {
    if response.total_items == 0 {
        return None;
    }
    let volume = response.items.into_iter().next()?;
    let info = volume.volume_info;

    let cover_url = best_cover(&info.image_links)
        .or_else(|| {
            volume.id.as_ref().map(|id| {
                format!(
                    "https://books.google.com/books/content?id={}&printsec=frontcover&img=1&zoom=1",
                    id
                )
            })
        })
        .unwrap_or_else(|| open_library_cover_url(isbn));

    Some(BookMetadata {
        title: info.title.unwrap_or_else(|| unknown_title(isbn)),
        author: info.authors.join(", "),
        isbn: isbn.to_string(),
        cover_url,
        description: info.description.unwrap_or_default(),
    })
}

/// Largest available cover, forced to https and full zoom
fn best_cover(links: &HashMap<String, String>) -> Option<String> {
    COVER_SIZES
        .iter()
        .find_map(|size| links.get(*size))
        .map(|url| {
            url.replacen("http://", "https://", 1)
                .replacen("&edge=curl", "", 1)
                .replacen("zoom=1", "zoom=0", 1)
        })
}
