//! Search-feed clients used for article discovery.
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Google News | [`google_news`] | RSS search, one request per query term |
//!
//! A client implements [`FeedSource`]: it takes one query term and returns
//! the candidates built from that response. Failures are absorbed inside
//! the client (logged, empty result) so discovery always moves on to the
//! next query.

use crate::models::ArticleCandidate;

pub mod google_news;

/// A searchable syndication feed.
pub trait FeedSource {
    /// Run one search. Never fails; a broken request yields no candidates.
    async fn search(&self, query: &str) -> Vec<ArticleCandidate>;
}
