//! Background polling of app/login status.
//!
//! A single long-lived task refreshes the status snapshot every poll
//! interval; the UI thread never blocks on network I/O and only reads the
//! latest published snapshot. Publication goes through a `watch` channel so
//! readers always see a whole snapshot, never a partial write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::draft_client::DraftClient;

/// Granularity at which the sleep between cycles re-checks the stop flag,
/// so teardown responds well before a full poll interval.
const STOP_CHECK_STEP: Duration = Duration::from_millis(100);

const MAX_DISPLAY_USERNAME: usize = 15;
const TRUNCATED_USERNAME_LEN: usize = 12;

/// Latest known app/login state. Written wholesale by the poller each
/// cycle; readers take a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub app_running: bool,
    pub is_logged_in: bool,
    pub username: Option<String>,
}

impl StatusSnapshot {
    /// Username shortened for panel display. The stored value stays the
    /// full username.
    pub fn display_username(&self) -> Option<String> {
        self.username.as_ref().map(|name| {
            if name.chars().count() <= MAX_DISPLAY_USERNAME {
                name.clone()
            } else {
                let head: String = name.chars().take(TRUNCATED_USERNAME_LEN).collect();
                format!("{head}...")
            }
        })
    }
}

enum Lifecycle {
    Stopped,
    Running {
        stop: Arc<AtomicBool>,
        handle: JoinHandle<()>,
    },
}

pub struct StatusPoller {
    client: DraftClient,
    poll_interval: Duration,
    snapshot_tx: watch::Sender<StatusSnapshot>,
    lifecycle: Mutex<Lifecycle>,
}

impl StatusPoller {
    pub fn new(client: DraftClient, poll_interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(StatusSnapshot::default());
        Self {
            client,
            poll_interval,
            snapshot_tx,
            lifecycle: Mutex::new(Lifecycle::Stopped),
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver for hosts that want change notifications instead of
    /// polling the snapshot on redraw.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        let lifecycle = self.lifecycle.lock().expect("poller lifecycle lock");
        match &*lifecycle {
            Lifecycle::Running { handle, .. } => !handle.is_finished(),
            Lifecycle::Stopped => false,
        }
    }

    /// Start the polling task. No-op when already running.
    pub fn start(&self) {
        let mut lifecycle = self.lifecycle.lock().expect("poller lifecycle lock");
        if matches!(*lifecycle, Lifecycle::Running { .. }) {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let client = self.client.clone();
        let snapshot_tx = self.snapshot_tx.clone();
        let interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            debug!("Status poller started");
            while !worker_stop.load(Ordering::Relaxed) {
                let snapshot = poll_cycle(&client).await;
                snapshot_tx.send_replace(snapshot);
                sleep_with_stop(interval, &worker_stop).await;
            }
            debug!("Status poller stopped");
        });

        *lifecycle = Lifecycle::Running { stop, handle };
    }

    /// Ask the polling task to stop and wait for it to wind down. No-op
    /// when already stopped. Cancellation is cooperative: a cycle already
    /// inside a network call finishes it (bounded by the request timeout)
    /// before observing the flag.
    pub async fn stop(&self) {
        let previous = {
            let mut lifecycle = self.lifecycle.lock().expect("poller lifecycle lock");
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };
        if let Lifecycle::Running { stop, handle } = previous {
            stop.store(true, Ordering::Relaxed);
            if let Err(err) = handle.await {
                warn!(error = ?err, "Status poller task ended abnormally");
            }
        }
    }

    /// Run one poll cycle on the caller's task and publish the result, for
    /// callers that cannot wait for the next scheduled cycle.
    pub async fn refresh_now(&self) -> StatusSnapshot {
        let snapshot = poll_cycle(&self.client).await;
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }
}

/// One health + auth round trip. `send` folds every failure into its
/// result, so a dead app degrades to a default snapshot instead of an
/// error; the loop can never die from a failed cycle.
async fn poll_cycle(client: &DraftClient) -> StatusSnapshot {
    if !client.health().await {
        return StatusSnapshot::default();
    }
    let auth = client.auth_status().await;
    StatusSnapshot {
        app_running: true,
        is_logged_in: auth.logged_in,
        username: auth.username,
    }
}

async fn sleep_with_stop(total: Duration, stop: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let step = remaining.min(STOP_CHECK_STEP);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
}
