//! Small helpers: the recency cutoff, char-safe truncation and the
//! output-path write check.

use chrono::{Duration, NaiveDateTime};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Cutoff instant for a window of `days_back` days ending at `now`.
pub fn cutoff_from(now: NaiveDateTime, days_back: u32) -> NaiveDateTime {
    now - Duration::days(i64::from(days_back))
}

/// The first `max` characters of `s`, never splitting a code point.
///
/// ```ignore
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Make sure the file at `path` can be created before any network work
/// starts.
///
/// Creates the parent directory if missing, then writes and removes a scratch
/// file next to the target.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_parent(path: &Path) -> Result<(), Box<dyn Error>> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&parent).await?;

    let scratch_path = parent.join("..__write_check__");
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!(dir = %parent.display(), "Output directory is writable");
    Ok(())
}
