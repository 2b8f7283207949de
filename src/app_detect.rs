//! Detect whether the DraftWolf app is installed on this machine, so the
//! panel can distinguish "not running" from "not installed". Filesystem
//! probes only, behind a TTL cache.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::cache::TtlCell;

// Bundle names the app has shipped under.
const MACOS_BUNDLE_NAMES: &[&str] = &["DraftWolf.app", "Draftwolf.app", "Draftflow.app"];
const WINDOWS_PROGRAM_DIRS: &[&str] = &["DraftWolf", "Draftflow"];

pub struct AppInstallCheck {
    cache: TtlCell<bool>,
}

impl AppInstallCheck {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCell::new(ttl),
        }
    }

    /// Whether the app appears to be installed. The probe result, positive
    /// or negative, is cached for the configured TTL.
    pub async fn is_installed(&self) -> bool {
        self.cache
            .get_or_compute(|| async {
                let installed = detect();
                debug!(installed, "Probed DraftWolf installation");
                installed
            })
            .await
    }
}

fn detect() -> bool {
    if cfg!(target_os = "macos") {
        bundle_present(Path::new("/Applications"))
    } else if cfg!(target_os = "windows") {
        windows_programs_dir()
            .map(|dir| program_dir_present(&dir))
            .unwrap_or(false)
    } else {
        // Unknown platforms report installed so the UI says "app not
        // running" rather than "not installed".
        true
    }
}

fn bundle_present(applications_dir: &Path) -> bool {
    MACOS_BUNDLE_NAMES
        .iter()
        .any(|name| applications_dir.join(name).is_dir())
}

fn windows_programs_dir() -> Option<PathBuf> {
    env::var_os("LOCALAPPDATA").map(|base| PathBuf::from(base).join("Programs"))
}

fn program_dir_present(programs_dir: &Path) -> bool {
    WINDOWS_PROGRAM_DIRS
        .iter()
        .any(|name| programs_dir.join(name).is_dir())
}
