//! Addon self-update check against GitHub releases.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::types::BridgeError;
use crate::version::{is_newer, parse_version, version_string};

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = "DraftWolf-Blender-Addon/1.0";
const RELEASE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of the most recent update check, read by the panel on redraw.
#[derive(Debug, Clone, Default)]
pub struct UpdateState {
    pub latest_version: Option<Vec<u64>>,
    pub release_url: Option<String>,
    pub update_available: bool,
    /// True only while a check is in flight.
    pub checking: bool,
    pub last_check: Option<Instant>,
    /// Set when the last check failed; cleared on the next check.
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    html_url: Option<String>,
}

pub struct UpdateChecker {
    http: Client,
    repo: Option<String>,
    api_base: String,
    current: Vec<u64>,
    state: UpdateState,
}

impl UpdateChecker {
    /// `repo` is the GitHub "owner/repo" to check; `None` disables checks.
    pub fn new(repo: Option<String>) -> Result<Self, BridgeError> {
        let http = Client::builder()
            .timeout(RELEASE_FETCH_TIMEOUT)
            .build()
            .map_err(BridgeError::Http)?;

        Ok(Self {
            http,
            repo,
            api_base: GITHUB_API_BASE.to_string(),
            current: parse_version(env!("CARGO_PKG_VERSION")).unwrap_or_else(|| vec![0]),
            state: UpdateState::default(),
        })
    }

    /// Point release lookups at a different API origin.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    pub fn current_version(&self) -> &[u64] {
        &self.current
    }

    /// Check the configured repository for a newer release. All failures
    /// fold into `error_message`. With no repository configured the check
    /// is skipped and any stale update notice is cleared.
    pub async fn check(&mut self) -> &UpdateState {
        self.state.checking = true;
        self.state.error_message = None;

        let Some(repo) = self.repo.clone() else {
            self.state.update_available = false;
            self.state.latest_version = None;
            self.state.release_url = None;
            self.state.checking = false;
            return &self.state;
        };

        self.state.last_check = Some(Instant::now());
        match self.fetch_latest_release(&repo).await {
            Ok((latest, release_url)) => {
                self.state.release_url = Some(release_url);
                self.state.update_available = is_newer(latest.as_deref(), Some(&self.current));
                self.state.latest_version = latest;
                if self.state.update_available {
                    if let Some(latest) = &self.state.latest_version {
                        info!(latest = %version_string(latest), "Addon update available");
                    }
                }
            }
            // A failed fetch resolves to "no update known", not to whatever
            // the previous check found.
            Err(err) => {
                warn!(repo = %repo, error = %err, "Update check failed");
                self.state.update_available = false;
                self.state.latest_version = None;
                self.state.release_url = None;
                self.state.error_message = Some(err.to_string());
            }
        }

        self.state.checking = false;
        &self.state
    }

    async fn fetch_latest_release(
        &self,
        repo: &str,
    ) -> Result<(Option<Vec<u64>>, String), BridgeError> {
        let url = format!("{}/repos/{repo}/releases/latest", self.api_base);
        let release: ReleaseResponse = self
            .http
            .get(&url)
            .header("Accept", GITHUB_ACCEPT)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let latest = parse_version(&release.tag_name);
        let release_url = release
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{repo}/releases"));
        Ok((latest, release_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_repo_clears_stale_update_notice() {
        let mut checker = UpdateChecker::new(None).expect("checker");
        checker.state.update_available = true;
        checker.state.latest_version = Some(vec![9, 9, 9]);
        checker.state.release_url = Some("https://example.invalid".to_string());
        checker.state.error_message = Some("old failure".to_string());

        let state = checker.check().await;
        assert!(!state.update_available);
        assert_eq!(state.latest_version, None);
        assert_eq!(state.release_url, None);
        assert_eq!(state.error_message, None);
        assert!(!state.checking);
    }

    #[tokio::test]
    async fn unreachable_release_api_folds_into_error_message() {
        let mut checker = UpdateChecker::new(Some("draftwolf/addon".to_string()))
            .expect("checker")
            .with_api_base("http://127.0.0.1:9");

        let state = checker.check().await;
        assert!(!state.update_available);
        assert!(state.error_message.is_some());
        assert!(!state.checking);
    }

    #[tokio::test]
    async fn failed_check_resets_a_stale_update_notice() {
        let mut checker = UpdateChecker::new(Some("draftwolf/addon".to_string()))
            .expect("checker")
            .with_api_base("http://127.0.0.1:9");
        checker.state.update_available = true;
        checker.state.latest_version = Some(vec![9, 9, 9]);
        checker.state.release_url = Some("https://example.invalid".to_string());

        let state = checker.check().await;
        assert!(!state.update_available);
        assert_eq!(state.latest_version, None);
        assert_eq!(state.release_url, None);
        assert!(state.error_message.is_some());
        assert!(state.last_check.is_some());
    }

    #[test]
    fn current_version_comes_from_the_crate() {
        let checker = UpdateChecker::new(None).expect("checker");
        assert!(!checker.current_version().is_empty());
    }
}
