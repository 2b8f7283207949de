//! Tuple-based version parsing and ordering for the addon self-update check.

use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digit run regex"));

/// Parse a version string into its numeric components.
///
/// Accepts an optional leading `v`/`V` and collects every maximal digit run
/// in order, so `"v1.2.3"` becomes `[1, 2, 3]` and `"2.1"` becomes `[2, 1]`.
/// Returns `None` when the string contains no digits at all.
pub fn parse_version(raw: &str) -> Option<Vec<u64>> {
    let trimmed = raw.trim();
    let rest = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
    let parts: Vec<u64> = DIGIT_RUN
        .find_iter(rest)
        .filter_map(|run| run.as_str().parse().ok())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// True when `latest` orders strictly after `current`.
///
/// Both sides are right-padded with zeros to the longer of the two lengths
/// (at least three components), so `[1, 0]` compares equal to `[1, 0, 0]`.
/// Absent versions are never newer than anything.
pub fn is_newer(latest: Option<&[u64]>, current: Option<&[u64]>) -> bool {
    let (Some(latest), Some(current)) = (latest, current) else {
        return false;
    };
    if latest.is_empty() || current.is_empty() {
        return false;
    }
    let width = latest.len().max(current.len()).max(3);
    let pad = |components: &[u64]| {
        let mut padded = components.to_vec();
        padded.resize(width, 0);
        padded
    };
    pad(latest) > pad(current)
}

/// `[1, 0, 0]` -> `"1.0.0"`.
pub fn version_string(components: &[u64]) -> String {
    components
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
