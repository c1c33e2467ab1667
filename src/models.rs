//! Data models for discovered articles.
//!
//! - [`ArticleCandidate`]: one feed entry as it moves through the pipeline
//! - [`FieldCompleteness`]: per-field fill counts reported after export

use crate::dates::{PublishDate, parse_date};

/// A single article discovered through the search feed.
///
/// Created from one feed entry during discovery and mutated in place once,
/// when the resolution stage fills in [`ArticleCandidate::resolved_url`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleCandidate {
    /// Headline with the trailing " - <Publisher>" suffix removed.
    pub title: String,
    /// Unparsed date text from the feed entry.
    pub publish_date_raw: String,
    /// Link as given by the feed (an intermediary redirect URL).
    pub source_link: String,
    /// Canonical publisher URL, empty until resolution runs.
    pub resolved_url: String,
    /// The feed carries no bylines; kept so the export schema is stable.
    pub author: String,
    /// Feed summaries repeat the title, so this stays empty.
    pub summary: String,
}

impl ArticleCandidate {
    /// Build a candidate from the raw fields of a feed entry.
    pub fn from_feed_entry(title: String, publish_date_raw: String, source_link: String) -> Self {
        Self {
            title,
            publish_date_raw,
            source_link,
            ..Self::default()
        }
    }

    /// Discovery dedup key: case-folded and whitespace-trimmed title.
    pub fn title_key(&self) -> String {
        self.title.trim().to_lowercase()
    }

    /// Parsed publish date, or [`PublishDate::Unknown`].
    pub fn publish_date(&self) -> PublishDate {
        parse_date(&self.publish_date_raw)
    }
}

/// How many exported records carry each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldCompleteness {
    pub total: usize,
    pub with_title: usize,
    pub with_date: usize,
    pub with_publisher_url: usize,
    pub with_author: usize,
    pub with_summary: usize,
}

impl FieldCompleteness {
    /// Tally field coverage; `domain` marks URLs that point at the publisher.
    pub fn tally(articles: &[ArticleCandidate], domain: &str) -> Self {
        let mut counts = Self {
            total: articles.len(),
            ..Self::default()
        };
        for article in articles {
            if !article.title.is_empty() {
                counts.with_title += 1;
            }
            if article.publish_date().is_known() {
                counts.with_date += 1;
            }
            if article.resolved_url.contains(domain) {
                counts.with_publisher_url += 1;
            }
            if !article.author.is_empty() {
                counts.with_author += 1;
            }
            if !article.summary.is_empty() {
                counts.with_summary += 1;
            }
        }
        counts
    }
}
