//! Host-agnostic core of the DraftWolf Blender addon: background status
//! polling, TTL-cached project-root lookups, filename reconciliation for
//! retrieved files, and the version-control operations of the locally
//! running DraftWolf app's HTTP API.
//!
//! The GUI host draws panels and opens files; this crate owns everything
//! stateful underneath. [`DraftBridge`] is the intended entry point.

mod app_detect;
mod bridge;
mod cache;
mod config;
mod draft_client;
mod paths;
mod status;
mod types;
mod update;
mod version;

pub use app_detect::AppInstallCheck;
pub use bridge::{DraftBridge, RestoreOutcome};
pub use cache::{TtlCache, TtlCell};
pub use config::{Config, API_URL_ENV};
pub use draft_client::{
    error_message, is_success, AuthStatus, CommandOutcome, CommitOutcome, DraftClient,
    HistoryList, VersionRecord, CONNECTION_ERROR, UNKNOWN_ERROR,
};
pub use paths::{clean_basename_for_matching, recover_original_path};
pub use status::{StatusPoller, StatusSnapshot};
pub use types::BridgeError;
pub use update::{UpdateChecker, UpdateState};
pub use version::{is_newer, parse_version, version_string};
