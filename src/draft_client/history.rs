//! Snapshot list of version-history entries held on behalf of the UI.

use std::time::Duration;

use tokio::time::Instant;

use super::api_types::VersionRecord;

/// Keep only the versions containing a file whose basename equals the
/// cleaned target basename.
pub fn filter_for_basename(
    records: Vec<VersionRecord>,
    target_lower: &str,
) -> Vec<VersionRecord> {
    records
        .into_iter()
        .filter(|record| record.matches_basename(target_lower))
        .collect()
}

/// The fetched history snapshot plus the staleness rules: a read is served
/// from the snapshot unless it was never fetched, the working file changed,
/// or the fetch interval has elapsed.
pub struct HistoryList {
    fetch_interval: Duration,
    entries: Vec<VersionRecord>,
    fetched_at: Option<Instant>,
    target: Option<String>,
}

impl HistoryList {
    pub fn new(fetch_interval: Duration) -> Self {
        Self {
            fetch_interval,
            entries: Vec::new(),
            fetched_at: None,
            target: None,
        }
    }

    pub fn entries(&self) -> &[VersionRecord] {
        &self.entries
    }

    pub fn is_stale(&self, target_lower: &str) -> bool {
        let Some(fetched_at) = self.fetched_at else {
            return true;
        };
        if self.target.as_deref() != Some(target_lower) {
            return true;
        }
        Instant::now().saturating_duration_since(fetched_at) >= self.fetch_interval
    }

    pub fn replace(&mut self, target_lower: String, entries: Vec<VersionRecord>) {
        self.entries = entries;
        self.target = Some(target_lower);
        self.fetched_at = Some(Instant::now());
    }

    /// Force the next read to re-fetch.
    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::time;

    use super::*;

    fn record(id: &str, file: &str) -> VersionRecord {
        serde_json::from_value(json!({
            "id": id,
            "versionNumber": "1",
            "label": "Test",
            "timestamp": "2024-05-01T10:00:00Z",
            "files": {file: {}}
        }))
        .expect("record")
    }

    #[test]
    fn filters_by_exact_basename() {
        let records = vec![
            record("a", "/work/Scene.blend"),
            record("b", "/work/scene-old.blend"),
            record("c", "/elsewhere/SCENE.BLEND"),
        ];
        let matched = filter_for_basename(records, "scene.blend");
        let ids: Vec<&str> = matched.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_goes_stale_after_the_fetch_interval() {
        let mut list = HistoryList::new(Duration::from_secs(10));
        assert!(list.is_stale("scene.blend"));

        list.replace("scene.blend".to_string(), vec![record("a", "scene.blend")]);
        assert!(!list.is_stale("scene.blend"));
        assert_eq!(list.entries().len(), 1);

        time::advance(Duration::from_secs(9)).await;
        assert!(!list.is_stale("scene.blend"));

        time::advance(Duration::from_secs(2)).await;
        assert!(list.is_stale("scene.blend"));
    }

    #[tokio::test(start_paused = true)]
    async fn changing_the_target_invalidates_the_snapshot() {
        let mut list = HistoryList::new(Duration::from_secs(10));
        list.replace("scene.blend".to_string(), Vec::new());
        assert!(!list.is_stale("scene.blend"));
        assert!(list.is_stale("other.blend"));

        list.invalidate();
        assert!(list.is_stale("scene.blend"));
    }
}
