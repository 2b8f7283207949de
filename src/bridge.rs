//! The single surface the GUI host talks to: lifecycle of the status
//! poller, cached project-root lookups, and every version-control
//! operation against the local app.

use std::path::{Path, PathBuf};

use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::app_detect::AppInstallCheck;
use crate::cache::TtlCache;
use crate::config::Config;
use crate::draft_client::{
    filter_for_basename, CommandOutcome, CommitOutcome, DraftClient, HistoryList, VersionRecord,
};
use crate::paths::{clean_basename_for_matching, recover_original_path};
use crate::status::{StatusPoller, StatusSnapshot};
use crate::types::BridgeError;
use crate::update::{UpdateChecker, UpdateState};

const NOT_INITIALIZED: &str = "Version control is not enabled for this project";
const FILE_NOT_SAVED: &str = "The working file has not been saved yet";
const LABEL_REQUIRED: &str = "A version id and a non-empty label are required";

/// Result of a restore: besides the server outcome, the path the host
/// should re-open, with any retrieval suffix stripped back off.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub outcome: CommandOutcome,
    pub reopen_path: PathBuf,
}

pub struct DraftBridge {
    client: DraftClient,
    roots: TtlCache<String, Option<String>>,
    install: AppInstallCheck,
    poller: StatusPoller,
    history: Mutex<HistoryList>,
    updates: Mutex<UpdateChecker>,
}

impl DraftBridge {
    pub fn new(config: Config) -> Result<Self, BridgeError> {
        let client = DraftClient::new(&config)?;
        let poller = StatusPoller::new(client.clone(), config.poll_interval());

        Ok(Self {
            roots: TtlCache::new(config.root_cache_ttl()),
            install: AppInstallCheck::new(config.install_cache_ttl()),
            history: Mutex::new(HistoryList::new(config.history_fetch_interval())),
            updates: Mutex::new(UpdateChecker::new(config.update_repo.clone())?),
            client,
            poller,
        })
    }

    // --- poller lifecycle -------------------------------------------------

    /// Start background status polling. No-op when already running.
    pub fn start(&self) {
        self.poller.start();
    }

    /// Stop background status polling. No-op when already stopped.
    pub async fn stop(&self) {
        self.poller.stop().await;
    }

    /// Immediate status refresh on the caller's task.
    pub async fn refresh_now(&self) -> StatusSnapshot {
        self.poller.refresh_now().await
    }

    /// Latest known app/login status; cheap enough for every redraw.
    pub fn status(&self) -> StatusSnapshot {
        self.poller.snapshot()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StatusSnapshot> {
        self.poller.subscribe()
    }

    /// Whether the app looks installed on this machine (90s cached probe).
    pub async fn app_installed(&self) -> bool {
        self.install.is_installed().await
    }

    // --- version-control operations ---------------------------------------

    /// Project root for the directory containing `file`, through the TTL
    /// cache. A missing root is cached too, so repeated negative lookups
    /// stay off the wire.
    pub async fn project_root(&self, file: &Path) -> Option<String> {
        let directory = file
            .parent()
            .and_then(|parent| parent.to_str())
            .filter(|dir| !dir.is_empty())?
            .to_string();
        let client = &self.client;
        self.roots
            .get_or_compute(directory, |dir| async move {
                client.find_root(&dir).await
            })
            .await
    }

    /// Enable version control for the project containing `file`.
    pub async fn enable_version_control(&self, file: &Path) -> CommandOutcome {
        let Some(directory) = file.parent().and_then(|parent| parent.to_str()) else {
            return CommandOutcome::failure(FILE_NOT_SAVED);
        };
        self.client.init_project(directory).await
    }

    /// Save `file` as a new version. On success the history snapshot is
    /// re-fetched so the UI sees the new entry without an explicit refresh.
    pub async fn commit(&self, file: &Path, label: &str) -> CommitOutcome {
        let Some(root) = self.project_root(file).await else {
            return CommitOutcome::failure(NOT_INITIALIZED);
        };
        let outcome = self
            .client
            .commit(&root, label, &[file.to_string_lossy().into_owned()])
            .await;
        if outcome.success {
            self.refresh_history(file).await;
        }
        outcome
    }

    /// Version-history entries matching `file`, served from the held
    /// snapshot while it is fresh. `None` when the app is unreachable or
    /// the project has no root.
    pub async fn version_history(&self, file: &Path) -> Option<Vec<VersionRecord>> {
        let target = clean_basename_for_matching(file);
        {
            let history = self.history.lock().await;
            if !history.is_stale(&target) {
                return Some(history.entries().to_vec());
            }
        }
        self.refresh_history(file).await
    }

    /// Unconditionally re-fetch and re-filter the history list for `file`.
    pub async fn refresh_history(&self, file: &Path) -> Option<Vec<VersionRecord>> {
        let root = self.project_root(file).await?;
        let records = self.client.history(&root).await?;
        let target = clean_basename_for_matching(file);
        debug!(target = %target, fetched = records.len(), "Refreshed version history");
        let filtered = filter_for_basename(records, &target);

        let mut history = self.history.lock().await;
        history.replace(target, filtered.clone());
        Some(filtered)
    }

    /// Restore a version. The returned `reopen_path` is the canonical path
    /// the host should open afterwards, whether or not the working file
    /// carried a retrieval suffix.
    pub async fn restore(&self, file: &Path, version_id: &str) -> RestoreOutcome {
        let reopen_path = recover_original_path(file);
        let Some(root) = self.project_root(file).await else {
            return RestoreOutcome {
                outcome: CommandOutcome::failure(NOT_INITIALIZED),
                reopen_path,
            };
        };
        let outcome = self.client.restore(&root, version_id).await;
        RestoreOutcome {
            outcome,
            reopen_path,
        }
    }

    /// Change a version's label. Blank labels are rejected before hitting
    /// the wire; a successful rename re-fetches the history snapshot.
    pub async fn rename_version(
        &self,
        file: &Path,
        version_id: &str,
        new_label: &str,
    ) -> CommandOutcome {
        let label = new_label.trim();
        if version_id.is_empty() || label.is_empty() {
            return CommandOutcome::failure(LABEL_REQUIRED);
        }
        let Some(root) = self.project_root(file).await else {
            return CommandOutcome::failure(NOT_INITIALIZED);
        };
        let outcome = self.client.rename_version(&root, version_id, label).await;
        if outcome.success {
            self.refresh_history(file).await;
        }
        outcome
    }

    // --- addon updates ----------------------------------------------------

    /// Run an update check now and return the resulting state.
    pub async fn check_for_updates(&self) -> UpdateState {
        self.updates.lock().await.check().await.clone()
    }

    /// Result of the most recent update check.
    pub async fn update_state(&self) -> UpdateState {
        self.updates.lock().await.state().clone()
    }
}
