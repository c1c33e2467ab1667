//! Publisher profile: who we are harvesting and how to ask the feed.
//!
//! The query catalog is data, not code. A profile can be loaded from YAML
//! (`--config`), and [`PublisherProfile::default`] carries the Miami Herald
//! catalog.
//!
//! ```yaml
//! display_name: Miami Herald
//! domain: miamiherald.com
//! topics: [news, local, crime]
//! locale:
//!   hl: en-US
//!   gl: US
//!   ceid: "US:en"
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

/// Google News RSS search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://news.google.com/rss/search";

const MIAMI_HERALD_TOPICS: [&str; 28] = [
    "news",
    "local",
    "crime",
    "politics",
    "business",
    "sports",
    "miami",
    "florida",
    "immigration",
    "entertainment",
    "opinion",
    "real estate",
    "education",
    "environment",
    "health",
    "dolphins",
    "heat",
    "marlins",
    "college",
    "broward",
    "miami-dade",
    "keys",
    "trump",
    "housing",
    "community",
    "cuba",
    "haiti",
    "technology",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse profile {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("profile field `{0}` must not be empty")]
    Empty(&'static str),
}

/// Fixed locale parameters sent with every search request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedLocale {
    pub hl: String,
    pub gl: String,
    pub ceid: String,
}

impl Default for FeedLocale {
    fn default() -> Self {
        Self {
            hl: "en-US".to_string(),
            gl: "US".to_string(),
            ceid: "US:en".to_string(),
        }
    }
}

/// Everything publisher-specific the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PublisherProfile {
    /// Name as it appears in feed `<source>` tags and title suffixes.
    pub display_name: String,
    /// Domain marker a canonical article URL must contain.
    pub domain: String,
    /// Topical modifiers appended to the site-scoped query.
    pub topics: Vec<String>,
    pub locale: FeedLocale,
    pub search_endpoint: String,
}

impl Default for PublisherProfile {
    fn default() -> Self {
        Self {
            display_name: "Miami Herald".to_string(),
            domain: "miamiherald.com".to_string(),
            topics: MIAMI_HERALD_TOPICS.iter().map(|t| t.to_string()).collect(),
            locale: FeedLocale::default(),
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
        }
    }
}

impl PublisherProfile {
    /// Load and validate a profile from a YAML file. Missing fields take
    /// their Miami Herald defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Parse`] on malformed YAML, and [`ConfigError::Empty`]
    /// when validation fails.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let profile = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        profile.validate()?;
        info!(publisher = %profile.display_name, queries = profile.query_catalog().len(), "Loaded publisher profile");
        Ok(profile)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Check that the fields every query and filter depend on are present.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Empty`] naming the first blank field among
    /// `display_name`, `domain` and `search_endpoint`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_name.trim().is_empty() {
            return Err(ConfigError::Empty("display_name"));
        }
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Empty("domain"));
        }
        if self.search_endpoint.trim().is_empty() {
            return Err(ConfigError::Empty("search_endpoint"));
        }
        Ok(())
    }

    /// The bare `site:` query followed by one query per topic.
    pub fn query_catalog(&self) -> Vec<String> {
        let scope = format!("site:{}", self.domain);
        std::iter::once(scope.clone())
            .chain(
                self.topics
                    .iter()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .map(|t| format!("{scope} {t}")),
            )
            .collect()
    }
}
