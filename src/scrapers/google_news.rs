//! Google News RSS search client.
//!
//! Each query becomes one `GET {endpoint}?q=<terms>&hl=..&gl=..&ceid=..`.
//! Items are read from the RSS body with `quick-xml`'s event reader; only
//! `title`, `link`, `pubDate` and `source` are kept.
//!
//! # Publisher filtering
//!
//! Broad query terms pull in syndicated copies from other outlets. Items
//! whose `<source>` names a different publisher are dropped; items without
//! a `<source>` are kept. Titles lose their ` - <Publisher>` suffix.

use crate::config::PublisherProfile;
use crate::models::ArticleCandidate;
use crate::scrapers::FeedSource;
use itertools::Itertools;
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use regex::Regex;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::mem;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// One `<item>` as it appears in the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    /// `None` when the item has no `<source>` element.
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Link,
    PubDate,
    Source,
}

impl FeedEntry {
    fn push(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Source => self.source.get_or_insert_with(String::new),
        };
        target.push_str(text);
    }

    fn trim(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.link = self.link.trim().to_string();
        self.pub_date = self.pub_date.trim().to_string();
        self.source = self.source.map(|s| s.trim().to_string());
        self
    }
}

/// Parse an RSS document into its items.
pub fn parse_feed(body: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    let mut reader = Reader::from_str(body);
    let mut entries = Vec::new();
    let mut current = FeedEntry::default();
    let mut in_item = false;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                field = match e.local_name().as_ref() {
                    b"item" => {
                        in_item = true;
                        current = FeedEntry::default();
                        None
                    }
                    b"title" if in_item => Some(Field::Title),
                    b"link" if in_item => Some(Field::Link),
                    b"pubDate" if in_item => Some(Field::PubDate),
                    b"source" if in_item => {
                        current.source.get_or_insert_with(String::new);
                        Some(Field::Source)
                    }
                    _ => None,
                };
            }
            Event::Text(t) => {
                if let Some(f) = field {
                    current.push(f, &t.decode()?);
                }
            }
            Event::CData(c) => {
                if let Some(f) = field {
                    current.push(f, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::GeneralRef(r) => {
                if let Some(f) = field {
                    if let Some(ch) = r.resolve_char_ref()? {
                        current.push(f, ch.encode_utf8(&mut [0u8; 4]));
                    } else {
                        let name = r.decode()?;
                        match resolve_predefined_entity(&name) {
                            Some(text) => current.push(f, text),
                            None => current.push(f, &format!("&{name};")),
                        }
                    }
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"item" && in_item {
                    in_item = false;
                    entries.push(mem::take(&mut current).trim());
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Publisher-specific rules applied to each feed entry.
#[derive(Debug, Clone)]
pub struct PublisherMatcher {
    display_name: String,
    title_suffix: Regex,
}

impl PublisherMatcher {
    pub fn new(display_name: &str) -> Result<Self, regex::Error> {
        let title_suffix = Regex::new(&format!(
            r"\s*[-–—]\s*{}\s*$",
            regex::escape(display_name)
        ))?;
        Ok(Self {
            display_name: display_name.to_string(),
            title_suffix,
        })
    }

    /// Remove a trailing ` - Publisher` (hyphen, en or em dash).
    pub fn strip_title_suffix(&self, title: &str) -> String {
        self.title_suffix.replace(title, "").trim().to_string()
    }

    /// Entries attributed to another outlet are rejected; unattributed
    /// entries pass.
    pub fn accepts_source(&self, source: Option<&str>) -> bool {
        match source {
            Some(name) if !name.is_empty() => name.contains(&self.display_name),
            _ => true,
        }
    }

    /// Turn raw feed entries into candidates for this publisher.
    pub fn to_candidates(&self, entries: Vec<FeedEntry>) -> Vec<ArticleCandidate> {
        entries
            .into_iter()
            .filter(|e| self.accepts_source(e.source.as_deref()))
            .map(|e| {
                ArticleCandidate::from_feed_entry(
                    self.strip_title_suffix(&e.title),
                    e.pub_date,
                    e.link,
                )
            })
            .collect()
    }
}

/// Google News RSS search client for one publisher.
#[derive(Debug, Clone)]
pub struct GoogleNewsClient {
    client: Client,
    endpoint: String,
    locale_query: String,
    matcher: PublisherMatcher,
}

impl GoogleNewsClient {
    /// Build a client for `profile`.
    ///
    /// # Arguments
    ///
    /// * `profile` - Publisher whose endpoint, locale and display name are used
    /// * `timeout` - Applied to every request
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built or the display name does not
    /// yield a valid suffix pattern.
    pub fn new(profile: &PublisherProfile, timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        let locale = &profile.locale;
        Ok(Self {
            client,
            endpoint: profile.search_endpoint.clone(),
            locale_query: format!(
                "hl={}&gl={}&ceid={}",
                urlencoding::encode(&locale.hl),
                urlencoding::encode(&locale.gl),
                locale.ceid
            ),
            matcher: PublisherMatcher::new(&profile.display_name)?,
        })
    }

    /// Search URL for `query`; words are percent-encoded and joined with `+`.
    pub fn search_url(&self, query: &str) -> String {
        let terms = query
            .split_whitespace()
            .map(urlencoding::encode)
            .join("+");
        format!("{}?q={}&{}", self.endpoint, terms, self.locale_query)
    }
}

impl FeedSource for GoogleNewsClient {
    #[instrument(level = "debug", skip(self))]
    async fn search(&self, query: &str) -> Vec<ArticleCandidate> {
        let url = self.search_url(query);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%query, error = %e, "Failed to fetch RSS");
                return Vec::new();
            }
        };
        if response.status() != StatusCode::OK {
            warn!(%query, status = %response.status(), "RSS returned non-success status");
            return Vec::new();
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%query, error = %e, "Failed to read RSS body");
                return Vec::new();
            }
        };

        match parse_feed(&body) {
            Ok(entries) => {
                debug!(%query, entries = entries.len(), "Parsed RSS");
                self.matcher.to_candidates(entries)
            }
            Err(e) => {
                warn!(%query, error = %e, "Failed to parse RSS");
                Vec::new()
            }
        }
    }
}
