//! HTTP JSON fetching with caching.
//!
//! Fetches JSON documents from upstream APIs and caches the raw bodies in
//! the raw data directory so repeated seeds and page loads do not hit the
//! remote API again while the cached copy is fresh.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Metadata stored alongside cached content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_length: usize,
    pub etag: Option<String>,
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Directory to cache raw responses
    pub cache_dir: PathBuf,

    /// How long cached content is considered fresh; zero disables caching
    pub cache_ttl: Duration,

    /// Maximum response size (default 20MB)
    pub max_content_size: usize,

    pub timeout: Duration,

    pub user_agent: String,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry
    pub retry_delay: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/raw"),
            cache_ttl: Duration::from_secs(3600),
            max_content_size: 20 * 1024 * 1024,
            timeout: Duration::from_secs(10),
            user_agent: format!("apex-data/{}", env!("CARGO_PKG_VERSION")),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

/// HTTP JSON fetcher with local caching.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("apex-data")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    /// Fetch and decode a JSON document, serving it from cache while fresh.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        if let Some(body) = self.read_cache(url).await? {
            match serde_json::from_slice(&body) {
                Ok(value) => return Ok(value),
                // A body that no longer decodes is refetched
                Err(e) => warn!("Discarding cached {}: {}", url, e),
            }
        }

        self.fetch_json_fresh(url).await
    }

    /// Fetch and decode from the network, ignoring and refreshing the cache.
    pub async fn fetch_json_fresh<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let (body, etag) = self.fetch_with_retry(url).await?;
        let value = serde_json::from_slice(&body)?;
        if let Err(e) = self.write_cache(url, &body, etag).await {
            warn!("Failed to cache {}: {}", url, e);
        }
        Ok(value)
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let mut delay = self.config.retry_delay;
        let mut attempt = 0;

        loop {
            match self.fetch_once(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        url, e, attempt, self.config.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<(Vec<u8>, Option<String>), FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let etag = response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.bytes().await?;
        if body.len() > self.config.max_content_size {
            return Err(FetchError::ContentTooLarge {
                size: body.len(),
                max_size: self.config.max_content_size,
            });
        }

        Ok((body.to_vec(), etag))
    }

    /// Cached body for a URL, if present and younger than the TTL.
    async fn read_cache(&self, url: &Url) -> Result<Option<Vec<u8>>, FetchError> {
        if self.config.cache_ttl.is_zero() {
            return Ok(None);
        }

        let cache_path = self.cache_path_for_url(url);
        let meta_path = self.meta_path_for_url(url);
        if !cache_path.exists() || !meta_path.exists() {
            return Ok(None);
        }

        let meta: CacheMetadata = match serde_json::from_str(&fs::read_to_string(&meta_path).await?) {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };

        if !Self::is_fresh(&meta, Utc::now(), self.config.cache_ttl) {
            debug!("Cache expired for {}", url);
            return Ok(None);
        }

        debug!("Serving {} from cache", url);
        Ok(Some(fs::read(&cache_path).await?))
    }

    async fn write_cache(&self, url: &Url, body: &[u8], etag: Option<String>) -> Result<(), FetchError> {
        if self.config.cache_ttl.is_zero() {
            return Ok(());
        }

        let cache_path = self.cache_path_for_url(url);
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&cache_path, body).await?;

        let meta = CacheMetadata {
            url: url.to_string(),
            fetched_at: Utc::now(),
            content_length: body.len(),
            etag,
        };
        fs::write(self.meta_path_for_url(url), serde_json::to_string_pretty(&meta)?).await?;
        Ok(())
    }

    fn is_fresh(meta: &CacheMetadata, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = now.signed_duration_since(meta.fetched_at);
        age.num_seconds() >= 0 && (age.num_seconds() as u64) < ttl.as_secs()
    }

    fn cache_path_for_url(&self, url: &Url) -> PathBuf {
        self.cache_file(url, "json")
    }

    fn meta_path_for_url(&self, url: &Url) -> PathBuf {
        self.cache_file(url, "meta.json")
    }

    fn cache_file(&self, url: &Url, extension: &str) -> PathBuf {
        let host = url.host_str().unwrap_or("unknown");
        self.config
            .cache_dir
            .join(host)
            .join(format!("{}.{}", Self::url_hash(url), extension))
    }

    /// Hash a URL (including query) to a short string.
    fn url_hash(url: &Url) -> String {
        let digest = Sha256::digest(url.as_str().as_bytes());
        hex::encode(&digest[..8])
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }
}
