//! Favicon resolution with placeholder detection.
//!
//! The favicon service answers 200 for unknown domains too, with a generic
//! placeholder image, so HTTP status alone cannot tell "has a favicon" from
//! "does not". The client probes the service once per process with a domain
//! guaranteed to be unknown, remembers the placeholder's digest, and treats
//! any response matching it as a miss.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use crate::error::ScrapeError;

/// A reserved TLD, so the service can only ever answer with its placeholder.
const PLACEHOLDER_PROBE_DOMAIN: &str = "favicon-placeholder-probe.invalid";

const ICON_SIZE: u32 = 64;

/// HTTP client for the favicon resolution service.
pub struct FaviconClient {
    client: Client,
    base_url: String,
    placeholder_digest: OnceCell<Option<[u8; 32]>>,
}

impl FaviconClient {
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
            placeholder_digest: OnceCell::new(),
        })
    }

    /// The icon URL the service serves for a domain.
    #[must_use]
    pub fn icon_url(&self, domain: &str) -> String {
        let encoded = utf8_percent_encode(domain, NON_ALPHANUMERIC);
        format!("{}?domain={}&sz={}", self.base_url, encoded, ICON_SIZE)
    }

    /// Resolves a favicon URL for a domain, or `None` when the service has
    /// nothing better than its generic placeholder. Any failure along the
    /// way is also `None`; synthesis falls through to the seed emoji or the
    /// globe.
    pub async fn resolve(&self, domain: &str) -> Option<String> {
        if domain.is_empty() {
            return None;
        }

        let digest = match self.fetch_digest(domain).await {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(domain, error = %e, "favicon fetch failed");
                return None;
            }
        };

        let placeholder = self
            .placeholder_digest
            .get_or_init(|| async {
                self.fetch_digest(PLACEHOLDER_PROBE_DOMAIN).await.ok()
            })
            .await;

        if placeholder.as_ref() == Some(&digest) {
            tracing::debug!(domain, "favicon matches service placeholder");
            return None;
        }

        Some(self.icon_url(domain))
    }

    async fn fetch_digest(&self, domain: &str) -> Result<[u8; 32], ScrapeError> {
        let url = self.icon_url(domain);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        Ok(Sha256::digest(&body).into())
    }
}
