//! Remote banner image loader for Vegapunk
//!
//! Fetches the decorative banner image configured for the page, verifies it
//! is a real raster image, and caches the outcome for the lifetime of the
//! process. Every failure path degrades to "no banner": the page simply
//! omits the image.

use crate::error::{Result, VegapunkError};
use crate::imaging;
use reqwest::Client;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

/// A fetched banner image ready to be served
#[derive(Debug, Clone)]
pub struct BannerImage {
    /// Raw image bytes as fetched
    pub bytes: Vec<u8>,
    /// MIME type detected from the bytes
    pub mime_type: String,
}

/// Loads and caches the remote banner image
///
/// The first page load triggers the fetch; the outcome (present or absent)
/// is cached so the upstream host is contacted at most once per process.
pub struct BannerLoader {
    client: Client,
    url: Option<Url>,
    max_bytes: usize,
    cache: Arc<RwLock<Option<Option<BannerImage>>>>,
}

impl BannerLoader {
    /// Create a loader for the given URL
    ///
    /// An invalid or non-http(s) URL disables the loader: the problem is
    /// logged once and [`BannerLoader::load`] always returns None.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(url: &str, timeout_seconds: u64, max_bytes: usize) -> Result<Self> {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Some(parsed),
            Ok(parsed) => {
                tracing::warn!("Banner URL has unsupported scheme {}: {}", parsed.scheme(), url);
                None
            }
            Err(e) => {
                tracing::warn!("Invalid banner URL {}: {}", url, e);
                None
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("vegapunk/0.1.0")
            .build()
            .map_err(|e| VegapunkError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: parsed,
            max_bytes,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Return the banner image, fetching it on first use
    ///
    /// Returns None when the URL is unusable, the fetch failed, or the body
    /// was not a decodable image. The outcome is cached either way.
    pub async fn load(&self) -> Option<BannerImage> {
        if let Ok(cache) = self.cache.read() {
            if let Some(outcome) = cache.as_ref() {
                return outcome.clone();
            }
        }

        let url = self.url.as_ref()?;

        let outcome = match self.fetch(url).await {
            Ok(banner) => {
                tracing::info!(
                    "Loaded banner image: {} bytes, {}",
                    banner.bytes.len(),
                    banner.mime_type
                );
                Some(banner)
            }
            Err(e) => {
                tracing::warn!("Failed to load banner image from {}: {:#}", url, e);
                None
            }
        };

        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(outcome.clone());
        }

        outcome
    }

    async fn fetch(&self, url: &Url) -> Result<BannerImage> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| VegapunkError::Fetch(format!("Banner request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VegapunkError::Fetch(format!("Banner host returned {}", status)).into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VegapunkError::Fetch(format!("Failed to read banner body: {}", e)))?;

        if bytes.len() > self.max_bytes {
            return Err(VegapunkError::Fetch(format!(
                "Banner image too large: {} bytes (limit {})",
                bytes.len(),
                self.max_bytes
            ))
            .into());
        }

        // Confirm the body is a raster image and derive its MIME type.
        let encoded = imaging::encode_image(&bytes)?;

        Ok(BannerImage {
            bytes: bytes.to_vec(),
            mime_type: encoded.mime_type,
        })
    }
}
