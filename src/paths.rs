//! Filename reconciliation for files materialized from restored versions.
//!
//! The DraftWolf app names restored files with a `-retrieved` suffix (plus a
//! disambiguation number or version tag when the name collides). These
//! helpers map such a decorated filename back to its canonical identity so
//! the working file can be matched against stored history entries. String
//! transformation only, no I/O.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-v[\d.]+$").expect("version suffix regex"));
static NUMBER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+$").expect("number suffix regex"));

const RETRIEVED_VERSION_MARKER: &str = "-retrieved-version";
const RETRIEVED_SUFFIX: &str = "-retrieved";
const RETRIEVED_PHRASE: &str = " retrieved version";

/// Recover the path a retrieved file was restored from.
///
/// `scene-retrieved.blend` and `scene-2-retrieved.blend` both map back to
/// `scene.blend`; `scene-retrieved-version-2024.blend` is truncated at the
/// marker. Paths without a retrieval suffix are returned unchanged.
pub fn recover_original_path(path: &Path) -> PathBuf {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return path.to_path_buf();
    };
    let (stem, ext) = split_stem_ext(file_name);

    if let Some(idx) = stem.find(RETRIEVED_VERSION_MARKER) {
        let tail = &stem[idx + RETRIEVED_VERSION_MARKER.len()..];
        // Marker counts only at the end of the stem or followed by a suffix.
        if tail.is_empty() || tail.starts_with('-') {
            return path.with_file_name(format!("{}{}", &stem[..idx], ext));
        }
    }

    if let Some(trimmed) = stem.strip_suffix(RETRIEVED_SUFFIX) {
        // A trailing `-<token>` segment is an appended disambiguation number.
        let kept = match trimmed.rsplit_once('-') {
            Some((head, _)) => head,
            None => trimmed,
        };
        return path.with_file_name(format!("{kept}{ext}"));
    }

    path.to_path_buf()
}

/// Canonical lower-cased basename used to match a working file against
/// stored version-history entries. Exact comparison only; callers lower-case
/// the stored basenames on their side.
pub fn clean_basename_for_matching(path: &Path) -> String {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return path.to_string_lossy().to_lowercase();
    };
    let (stem, ext) = split_stem_ext(file_name);
    let lowered = stem.to_lowercase();

    let clean = if let Some(idx) = lowered.find(RETRIEVED_PHRASE) {
        lowered[..idx].to_string()
    } else if stem.contains(RETRIEVED_SUFFIX) {
        let stripped = stem.replace(RETRIEVED_SUFFIX, "");
        let stripped = VERSION_SUFFIX.replace(&stripped, "").into_owned();
        NUMBER_SUFFIX.replace(&stripped, "").into_owned()
    } else {
        stem.to_string()
    };

    format!("{clean}{ext}").to_lowercase()
}

/// Split `scene.blend` into `("scene", ".blend")`. A leading dot alone does
/// not count as an extension.
fn split_stem_ext(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}
