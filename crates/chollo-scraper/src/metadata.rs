//! Client for the page-metadata scraping API (a microlink-style service).
//!
//! Every field in the response is optional; a submission form pre-fills what
//! arrived and leaves the rest for manual entry. No retries: a failed scrape
//! is simply skipped.

use std::time::Duration;

use chollo_core::store::StoreHints;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// Best-effort metadata scraped from a product page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub image_url: Option<String>,
    pub logo_url: Option<String>,
}

impl PageMetadata {
    /// The fields store synthesis cares about.
    #[must_use]
    pub fn store_hints(&self) -> StoreHints {
        StoreHints {
            publisher: self.publisher.clone(),
            title: self.title.clone(),
            logo_url: self.logo_url.clone(),
        }
    }
}

// Wire shape of the scraping service's JSON envelope.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    data: Option<ScrapeData>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    title: Option<String>,
    description: Option<String>,
    publisher: Option<String>,
    image: Option<ScrapeAsset>,
    logo: Option<ScrapeAsset>,
}

#[derive(Debug, Deserialize)]
struct ScrapeAsset {
    url: Option<String>,
}

/// HTTP client for the metadata scraping service.
pub struct MetadataClient {
    client: Client,
    base_url: String,
}

impl MetadataClient {
    /// Creates a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches metadata for a product URL.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::UnexpectedStatus`] — any non-2xx status.
    /// - [`ScrapeError::Http`] — network or timeout failure.
    /// - [`ScrapeError::Deserialize`] — response body is not the expected JSON.
    pub async fn fetch(&self, url: &str) -> Result<PageMetadata, ScrapeError> {
        let encoded = utf8_percent_encode(url, NON_ALPHANUMERIC);
        let request_url = format!("{}/?url={}", self.base_url, encoded);

        let response = self.client.get(&request_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: request_url,
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<ScrapeResponse>(&body).map_err(|e| {
            ScrapeError::Deserialize {
                context: format!("metadata for {url}"),
                source: e,
            }
        })?;

        let data = parsed.data.unwrap_or_default();
        Ok(PageMetadata {
            title: non_empty(data.title),
            description: non_empty(data.description),
            publisher: non_empty(data.publisher),
            image_url: non_empty(data.image.and_then(|a| a.url)),
            logo_url: non_empty(data.logo.and_then(|a| a.url)),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
