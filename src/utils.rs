//! Utility functions for string handling, file naming and output directories.
//!
//! - String truncation for logging and diagnostics
//! - JSON error detection for handling LLM response truncation
//! - Run date in the report's home timezone
//! - Collision-free filenames for upload retries
//! - File system validation for output directories

use std::fs as stdfs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rand::distr::Alphanumeric;
use rand::{rng, Rng};
use tokio::fs;
use tracing::{info, instrument};

use crate::error::ReportResult;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended. Cuts never split a multi-byte character.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON fails to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Calendar date of `now` in `tz`.
///
/// The runner's clock is usually UTC; the report date is Zurich's.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Derive a filename that cannot collide with an earlier upload of `original`.
///
/// `report.pdf` becomes `report-20250819063000-k3x9qa.pdf`: the stem is kept so
/// the store's search-by-name still finds it. The stamp is `now` in its own
/// timezone.
pub fn unique_filename(original: &str, now: DateTime<Tz>) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("artifact");
    let stamp = now.format("%Y%m%d%H%M%S");
    let suffix: String = rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase();

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{stamp}-{suffix}.{ext}"),
        None => format!("{stem}-{stamp}-{suffix}"),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> ReportResult<()> {
    fs::create_dir_all(path).await?;
    // a small sync write has the simpler error surface
    let scratch_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Output directory is writable");
    Ok(())
}
