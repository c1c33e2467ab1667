//! The harvest stages, run strictly in sequence:
//!
//! 1. [`discover`]: fan the query catalog through a [`FeedSource`], merging
//!    by title
//! 2. [`filter_by_date`]: drop candidates older than the cutoff
//! 3. [`resolve_urls`]: turn redirect links into publisher URLs
//! 4. [`dedup_by_url`]: drop candidates sharing a canonical URL
//!
//! Title dedup and URL dedup stay separate: two entries with different
//! titles may still resolve to the same article.

use crate::models::ArticleCandidate;
use crate::resolver::{RedirectDecoder, resolve_redirect};
use crate::scrapers::FeedSource;
use crate::urls::normalize_url;
use chrono::NaiveDateTime;
use itertools::Itertools;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Run every query in order and keep the first candidate seen per title
/// key. Candidates with an empty key are skipped. `pacing` is slept between
/// consecutive queries.
#[instrument(level = "info", skip_all, fields(queries = queries.len()))]
pub async fn discover<S: FeedSource>(
    source: &S,
    queries: &[String],
    pacing: Duration,
) -> Vec<ArticleCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for (i, query) in queries.iter().enumerate() {
        info!("[{}/{}] Fetching: {}", i + 1, queries.len(), query);
        let results = source.search(query).await;
        let fetched = results.len();

        let mut new = 0usize;
        for candidate in results {
            let key = candidate.title_key();
            if !key.is_empty() && seen.insert(key) {
                unique.push(candidate);
                new += 1;
            }
        }
        info!(fetched, new, total = unique.len(), "Merged query results");

        if i + 1 < queries.len() && !pacing.is_zero() {
            sleep(pacing).await;
        }
    }

    unique
}

/// Keep candidates whose date is unknown or not older than `cutoff`.
pub fn filter_by_date(articles: Vec<ArticleCandidate>, cutoff: NaiveDateTime) -> Vec<ArticleCandidate> {
    let before = articles.len();
    let kept: Vec<ArticleCandidate> = articles
        .into_iter()
        .filter(|a| a.publish_date().is_on_or_after(cutoff))
        .collect();
    info!(kept = kept.len(), removed = before - kept.len(), "Date filter applied");
    kept
}

/// Fill in `resolved_url` for every candidate.
///
/// Publisher URLs are normalized; fallbacks keep the original link as-is.
pub fn resolve_urls<D: RedirectDecoder + ?Sized>(
    mut articles: Vec<ArticleCandidate>,
    decoder: &D,
    domain: &str,
) -> Vec<ArticleCandidate> {
    info!(count = articles.len(), "Resolving article URLs");
    let mut resolved = 0usize;

    for article in articles.iter_mut() {
        let resolution = resolve_redirect(decoder, &article.source_link, domain);
        article.resolved_url = if resolution.is_publisher() {
            resolved += 1;
            normalize_url(&resolution.into_url())
        } else {
            resolution.into_url()
        };
    }

    info!(
        resolved,
        fallback = articles.len() - resolved,
        total = articles.len(),
        %domain,
        "Resolved URLs to publisher domain"
    );
    articles
}

/// Keep the first candidate per normalized `resolved_url`.
pub fn dedup_by_url(articles: Vec<ArticleCandidate>) -> Vec<ArticleCandidate> {
    let before = articles.len();
    let unique: Vec<ArticleCandidate> = articles
        .into_iter()
        .unique_by(|a| normalize_url(&a.resolved_url))
        .collect();
    info!(unique = unique.len(), removed = before - unique.len(), "Dedup by URL");
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::google_link;
    use crate::resolver::{DecodeError, GoogleNewsDecoder};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory feed keyed by query; records the queries it was asked.
    #[derive(Default)]
    struct FakeFeed {
        responses: HashMap<String, Vec<ArticleCandidate>>,
        asked: RefCell<Vec<String>>,
    }

    impl FakeFeed {
        fn with(mut self, query: &str, titles: &[&str]) -> Self {
            let candidates = titles
                .iter()
                .map(|t| candidate(t, "2026-10-10", &format!("https://news.google.com/rss/articles/{query}-{t}")))
                .collect();
            self.responses.insert(query.to_string(), candidates);
            self
        }
    }

    impl FeedSource for FakeFeed {
        async fn search(&self, query: &str) -> Vec<ArticleCandidate> {
            self.asked.borrow_mut().push(query.to_string());
            self.responses.get(query).cloned().unwrap_or_default()
        }
    }

    struct FailingDecoder;

    impl RedirectDecoder for FailingDecoder {
        fn decode(&self, _: &str) -> Result<String, DecodeError> {
            Err(DecodeError::Truncated)
        }
    }

    fn candidate(title: &str, date: &str, link: &str) -> ArticleCandidate {
        ArticleCandidate::from_feed_entry(title.to_string(), date.to_string(), link.to_string())
    }

    fn resolved(title: &str, url: &str) -> ArticleCandidate {
        let mut c = candidate(title, "", "https://news.google.com/rss/articles/x");
        c.resolved_url = url.to_string();
        c
    }

    fn cutoff() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 9, 14)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn queries(qs: &[&str]) -> Vec<String> {
        qs.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn test_discover_merges_by_title_first_wins() {
        let feed = FakeFeed::default()
            .with("a", &["Budget Vote Passes", "Storm Hits Florida"])
            .with("b", &["budget vote passes ", "Heat Win"]);

        let found = discover(&feed, &queries(&["a", "b"]), Duration::ZERO).await;

        let titles: Vec<&str> = found.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Budget Vote Passes", "Storm Hits Florida", "Heat Win"]);
        assert_eq!(
            found[0].source_link,
            "https://news.google.com/rss/articles/a-Budget Vote Passes"
        );
    }

    #[tokio::test]
    async fn test_discover_skips_empty_titles_and_failed_queries() {
        let feed = FakeFeed::default().with("a", &["", "   ", "Only Story"]);

        let found = discover(&feed, &queries(&["down", "a", "also-down"]), Duration::ZERO).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Only Story");
        assert_eq!(*feed.asked.borrow(), vec!["down", "a", "also-down"]);
    }

    #[tokio::test]
    async fn test_discover_never_yields_duplicate_title_keys() {
        let feed = FakeFeed::default()
            .with("a", &["One", "ONE", "Two"])
            .with("b", &[" two", "Three", "one "])
            .with("c", &["three", "Four"]);

        let found = discover(&feed, &queries(&["a", "b", "c"]), Duration::ZERO).await;

        let keys: HashSet<String> = found.iter().map(|c| c.title_key()).collect();
        assert_eq!(keys.len(), found.len());
        assert_eq!(found.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_paces_between_queries() {
        let feed = FakeFeed::default();
        let start = tokio::time::Instant::now();

        discover(&feed, &queries(&["a", "b", "c"]), Duration::from_secs(1)).await;

        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_filter_by_date_keeps_unknown_and_recent() {
        let articles = vec![
            candidate("recent", "Tue, 13 Oct 2026 14:05:00 GMT", "l1"),
            candidate("old", "Thu, 20 Aug 2026 09:00:00 GMT", "l2"),
            candidate("undated", "not a date", "l3"),
            candidate("boundary", "2026-09-14T12:00:00", "l4"),
            candidate("just before", "2026-09-14T11:59:59", "l5"),
        ];

        let kept = filter_by_date(articles.clone(), cutoff());

        let titles: Vec<&str> = kept.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["recent", "undated", "boundary"]);

        for a in &kept {
            assert!(a.publish_date().is_on_or_after(cutoff()));
        }
        for a in articles.iter().filter(|a| !kept.contains(a)) {
            assert!(a.publish_date().is_known());
            assert!(!a.publish_date().is_on_or_after(cutoff()));
        }
    }

    #[test]
    fn test_filter_compares_wall_clock_ignoring_offset() {
        // 11:00 at -0500 is 16:00 UTC, after the cutoff in UTC terms, but the
        // offset is discarded so the naive 11:00 is what gets compared.
        let articles = vec![candidate("west", "Mon, 14 Sep 2026 11:00:00 -0500", "l1")];
        assert!(filter_by_date(articles, cutoff()).is_empty());
    }

    #[test]
    fn test_resolve_urls_normalizes_publisher_urls() {
        let link = google_link("http://amp.miamiherald.com/news/a1.html?utm=x");
        let articles = vec![candidate("a", "", &link)];

        let out = resolve_urls(articles, &GoogleNewsDecoder, "miamiherald.com");

        assert_eq!(out[0].resolved_url, "https://www.miamiherald.com/news/a1.html");
        assert_eq!(out[0].source_link, link);
    }

    #[test]
    fn test_resolve_urls_decode_failure_keeps_original_link() {
        let link = "https://news.google.com/rss/articles/CBMiZZZ?oc=5";
        let out = resolve_urls(vec![candidate("a", "", link)], &FailingDecoder, "miamiherald.com");
        assert_eq!(out[0].resolved_url, link);
    }

    #[test]
    fn test_resolve_urls_foreign_domain_falls_back() {
        let link = google_link("https://www.example.com/story");
        let out = resolve_urls(vec![candidate("a", "", &link)], &GoogleNewsDecoder, "miamiherald.com");
        assert_eq!(out[0].resolved_url, link);
    }

    #[test]
    fn test_dedup_by_url_tracking_variant() {
        let articles = vec![
            resolved("first", "https://www.miamiherald.com/news/a1.html?utm=x"),
            resolved("second", "https://www.miamiherald.com/news/a1.html"),
            resolved("third", "https://www.miamiherald.com/news/a2.html"),
        ];

        let unique = dedup_by_url(articles);

        let titles: Vec<&str> = unique.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "third"]);
    }

    #[test]
    fn test_dedup_by_url_never_emits_same_key_twice() {
        let articles = vec![
            resolved("a", "https://amp.miamiherald.com/x/"),
            resolved("b", "http://www.miamiherald.com/x"),
            resolved("c", "https://www.miamiherald.com/x#frag"),
            resolved("d", "https://www.miamiherald.com/y"),
        ];

        let unique = dedup_by_url(articles);

        let keys: HashSet<String> = unique.iter().map(|a| normalize_url(&a.resolved_url)).collect();
        assert_eq!(keys.len(), unique.len());
        assert_eq!(unique.len(), 2);
    }

    #[tokio::test]
    async fn test_full_run_through_export() {
        let a1 = google_link("https://www.miamiherald.com/news/a1.html?utm=x");
        let a1_again = google_link("https://amp.miamiherald.com/news/a1.html");
        let feed = FakeFeed {
            responses: HashMap::from([
                (
                    "q1".to_string(),
                    vec![
                        candidate("Storm Hits Florida", "Tue, 13 Oct 2026 14:05:00 GMT", &a1),
                        candidate("Undated Story", "not a date", "https://news.google.com/rss/articles/opaque?oc=5"),
                        candidate("Old News", "Thu, 20 Aug 2026 09:00:00 GMT", &google_link("https://www.miamiherald.com/old")),
                    ],
                ),
                (
                    "q2".to_string(),
                    vec![
                        candidate("storm hits florida", "Mon, 12 Oct 2026 09:00:00 GMT", &google_link("https://www.miamiherald.com/other")),
                        candidate("Storm Hits Florida (updated)", "Mon, 12 Oct 2026 10:00:00 GMT", &a1_again),
                        candidate("Heat Win", "Mon, 05 Oct 2026 20:00:00 GMT", &google_link("https://www.miamiherald.com/sports/heat.html")),
                    ],
                ),
            ]),
            ..FakeFeed::default()
        };

        let found = discover(&feed, &queries(&["q1", "q2"]), Duration::ZERO).await;
        assert_eq!(found.len(), 5);
        let recent = filter_by_date(found, cutoff());
        assert_eq!(recent.len(), 4);
        let resolved = resolve_urls(recent, &GoogleNewsDecoder, "miamiherald.com");
        let unique = dedup_by_url(resolved);

        let csv = String::from_utf8(crate::outputs::csv::render(&unique).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "title,url,publish_date,author,summary",
                "Storm Hits Florida,https://www.miamiherald.com/news/a1.html,2026-10-13,,",
                "Heat Win,https://www.miamiherald.com/sports/heat.html,2026-10-05,,",
                "Undated Story,https://news.google.com/rss/articles/opaque?oc=5,,,",
            ]
        );
    }
}
