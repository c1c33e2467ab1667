//! URL canonicalization for equality comparison.

use once_cell::sync::Lazy;
use regex::Regex;

static AMP_MIRROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://amp\.").unwrap());

/// Canonicalize a URL so that mirror, tracking and scheme variants of the
/// same article compare equal.
///
/// Steps, in order:
/// 1. rewrite an `amp.` mirror host prefix to `www.`
/// 2. drop the query string and fragment
/// 3. drop trailing slashes
/// 4. force the `https` scheme
///
/// Idempotent, and empty input yields empty output.
///
/// ```ignore
/// assert_eq!(
///     normalize_url("http://amp.miamiherald.com/news/a1.html?utm=x#top"),
///     "https://www.miamiherald.com/news/a1.html"
/// );
/// ```
pub fn normalize_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let url = AMP_MIRROR.replace(url, "https://www.");
    let url = url.split(['?', '#']).next().unwrap_or_default();
    let url = url.trim_end_matches('/');
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}
