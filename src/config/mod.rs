//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::FetcherConfig;
use crate::jolpica::{DEFAULT_BASE_URL, MAX_PAGE_SIZE};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Upstream API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JolpicaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay, doubled per attempt
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// 0 disables the response cache
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Rows per request on paged endpoints (max 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_page_size() -> u32 {
    100
}

impl Default for JolpicaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            cache_ttl_seconds: default_cache_ttl(),
            page_size: default_page_size(),
        }
    }
}

impl JolpicaConfig {
    /// Fetcher settings for this API, caching under `cache_dir`.
    pub fn fetcher_config(&self, cache_dir: PathBuf) -> FetcherConfig {
        FetcherConfig {
            cache_dir,
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            timeout: Duration::from_secs(self.timeout_seconds),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..Default::default()
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed origin, or "*" for any
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub jolpica: JolpicaConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            jolpica: JolpicaConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jolpica.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Jolpica timeout must be greater than 0".to_string(),
            ));
        }

        if self.jolpica.page_size == 0 || self.jolpica.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "Jolpica page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if url::Url::parse(&self.jolpica.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Jolpica base URL '{}' is not a valid URL",
                self.jolpica.base_url
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
