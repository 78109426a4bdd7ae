//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::hub::HF_HUB_BASE;
use crate::utils::{BoundedTimeout, RetrySettings};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hub endpoint and credentials
    #[serde(default)]
    pub hub: HubConfig,

    /// Download settings
    #[serde(default)]
    pub downloads: DownloadsConfig,

    /// Retry and worker pool settings
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub: HubConfig::default(),
            downloads: DownloadsConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Hub connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Base URL of the hub API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Access token for gated or private datasets (optional)
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

fn default_endpoint() -> String {
    HF_HUB_BASE.to_string()
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Default download directory
    #[serde(default = "default_download_dir")]
    pub default_path: PathBuf,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            default_path: default_download_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Retry and concurrency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in seconds
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,

    /// Maximum concurrent hub calls
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            max_workers: default_max_workers(),
        }
    }
}

impl RetryConfig {
    /// Retry settings for hub calls
    pub fn settings(&self) -> RetrySettings {
        RetrySettings::default()
            .max_retries(self.max_retries)
            .base_delay(Duration::from_secs_f64(self.base_delay_secs))
    }

    /// Worker pool sized and timed per this config
    pub fn worker_pool(&self) -> BoundedTimeout {
        BoundedTimeout::new(self.max_workers, Duration::from_secs(self.timeout_secs))
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_secs() -> f64 {
    5.0
}

fn default_max_workers() -> usize {
    2
}

/// Load configuration from a file
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("HUBFETCH"))
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}

/// Locate a config file in the default search locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("hubfetch.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("hubfetch/config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hub.endpoint, HF_HUB_BASE);
        assert_eq!(config.downloads.default_path, PathBuf::from("./data"));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_workers, 2);
    }

    #[test]
    fn test_retry_config_conversions() {
        let retry = RetryConfig::default();
        let settings = retry.settings();
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.base_delay, Duration::from_secs(5));

        let pool = retry.worker_pool();
        assert_eq!(pool.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_config_merges_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hubfetch.toml");
        std::fs::write(
            &path,
            "[hub]\nendpoint = \"https://hub.example\"\n\n[retry]\nmax_retries = 1\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.hub.endpoint, "https://hub.example");
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.max_workers, 2);
        assert_eq!(config.downloads.default_path, PathBuf::from("./data"));
    }
}
