//! CSV export.
//!
//! Rows are ordered newest first; records with an unknown publish date go
//! last, keeping their relative order. Columns are fixed:
//!
//! | column | value |
//! |--------|-------|
//! | `title` | stripped headline |
//! | `url` | resolved URL (or the original link on fallback) |
//! | `publish_date` | `YYYY-MM-DD`, empty when unknown |
//! | `author` | always empty |
//! | `summary` | always empty, capped at 500 characters |

use crate::models::ArticleCandidate;
use crate::utils::truncate_chars;
use serde::Serialize;
use std::cmp::Reverse;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const COLUMNS: [&str; 5] = ["title", "url", "publish_date", "author", "summary"];
pub const SUMMARY_MAX_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    url: &'a str,
    publish_date: String,
    author: &'a str,
    summary: &'a str,
}

impl<'a> From<&'a ArticleCandidate> for CsvRow<'a> {
    fn from(article: &'a ArticleCandidate) -> Self {
        Self {
            title: &article.title,
            url: &article.resolved_url,
            publish_date: article.publish_date().to_day_string(),
            author: &article.author,
            summary: truncate_chars(&article.summary, SUMMARY_MAX_CHARS),
        }
    }
}

/// Articles in export order: publish date descending, unknown dates last.
pub fn sorted_for_export(articles: &[ArticleCandidate]) -> Vec<&ArticleCandidate> {
    let mut sorted: Vec<&ArticleCandidate> = articles.iter().collect();
    sorted.sort_by_cached_key(|a| Reverse(a.publish_date()));
    sorted
}

/// Render the CSV document, header included even when there are no rows.
pub fn render(articles: &[ArticleCandidate]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for article in sorted_for_export(articles) {
        writer.serialize(CsvRow::from(article))?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Write the CSV file to `path`, creating its parent directory if needed.
///
/// Returns the number of rows written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_csv(articles: &[ArticleCandidate], path: &Path) -> Result<usize, Box<dyn Error>> {
    let bytes = render(articles)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;

    info!(rows = articles.len(), "Wrote CSV");
    Ok(articles.len())
}
