use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::types::BridgeError;

/// Environment override for the local app origin, useful when the app runs
/// on a non-default port.
pub const API_URL_ENV: &str = "DRAFTWOLF_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port the local DraftWolf app listens on.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Timeout for every operational call against the local app.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Pause between background status poll cycles.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a project-root lookup stays valid.
    #[serde(default = "default_root_cache_ttl_secs")]
    pub root_cache_ttl_secs: u64,

    /// How long the installed-app detection result stays valid.
    #[serde(default = "default_install_cache_ttl_secs")]
    pub install_cache_ttl_secs: u64,

    /// Minimum age before the version-history list is re-fetched on read.
    #[serde(default = "default_history_fetch_interval_secs")]
    pub history_fetch_interval_secs: u64,

    /// GitHub "owner/repo" used for addon update checks; `None` disables
    /// the check entirely.
    #[serde(default)]
    pub update_repo: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            request_timeout_ms: default_request_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            root_cache_ttl_secs: default_root_cache_ttl_secs(),
            install_cache_ttl_secs: default_install_cache_ttl_secs(),
            history_fetch_interval_secs: default_history_fetch_interval_secs(),
            update_repo: None,
        }
    }
}

fn default_api_port() -> u16 {
    45000
}

fn default_request_timeout_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_root_cache_ttl_secs() -> u64 {
    30
}

fn default_install_cache_ttl_secs() -> u64 {
    90
}

fn default_history_fetch_interval_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from a JSON file.
    /// Falls back to defaults if the file doesn't exist or can't be parsed.
    pub async fn load(path: &Path) -> Self {
        match Self::try_load(path).await {
            Ok(config) => {
                info!(port = config.api_port, "Loaded configuration");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = ?err, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    async fn try_load(path: &Path) -> Result<Self, BridgeError> {
        if !path.exists() {
            return Err(BridgeError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)
            .await
            .map_err(|err| BridgeError::Config(format!("failed to read config file: {err}")))?;

        serde_json::from_str(&contents)
            .map_err(|err| BridgeError::Config(format!("failed to parse config: {err}")))
    }

    /// Origin of the local app API. The env override wins when set and
    /// non-empty.
    pub fn api_url(&self) -> String {
        if let Ok(custom) = env::var(API_URL_ENV) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                return trimmed.trim_end_matches('/').to_string();
            }
        }
        format!("http://127.0.0.1:{}", self.api_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn root_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.root_cache_ttl_secs)
    }

    pub fn install_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.install_cache_ttl_secs)
    }

    pub fn history_fetch_interval(&self) -> Duration {
        Duration::from_secs(self.history_fetch_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_app_contract() {
        let config = Config::default();
        assert_eq!(config.api_port, 45000);
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.root_cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.install_cache_ttl(), Duration::from_secs(90));
        assert_eq!(config.history_fetch_interval(), Duration::from_secs(10));
        assert!(config.update_repo.is_none());
    }

    #[tokio::test]
    async fn partial_config_files_fill_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_port": 46123}"#).expect("write config");

        let config = Config::load(&path).await;
        assert_eq!(config.api_port, 46123);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn missing_or_broken_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let config = Config::load(&dir.path().join("nope.json")).await;
        assert_eq!(config.api_port, 45000);

        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write config");
        let config = Config::load(&path).await;
        assert_eq!(config.api_port, 45000);
    }
}
