//! Tolerant publish-date parsing.
//!
//! Feed dates arrive in several textual shapes. [`parse_date`] tries each
//! known format in a fixed order and falls back to an ISO date+time prefix
//! match. Anything else is [`PublishDate::Unknown`], which the filter keeps
//! and the exporter sorts last.
//!
//! Timezone offsets are dropped after parsing: the wall-clock time as
//! written is kept and all comparisons are naive.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})T(\d{2}:\d{2}:\d{2})").unwrap());

/// A parsed publish date, or the explicit absence of one.
///
/// `Unknown` orders before every `Known` value, so a descending sort puts
/// unknown dates last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PublishDate {
    Unknown,
    Known(NaiveDateTime),
}

impl PublishDate {
    /// Whether a date was recovered from the raw feed value.
    pub fn is_known(&self) -> bool {
        matches!(self, PublishDate::Known(_))
    }

    /// `true` unless the date is known and strictly before `cutoff`.
    pub fn is_on_or_after(&self, cutoff: NaiveDateTime) -> bool {
        match self {
            PublishDate::Unknown => true,
            PublishDate::Known(dt) => *dt >= cutoff,
        }
    }

    /// `YYYY-MM-DD`, or an empty string when unknown.
    pub fn to_day_string(&self) -> String {
        match self {
            PublishDate::Unknown => String::new(),
            PublishDate::Known(dt) => dt.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Parse a raw feed date.
pub fn parse_date(raw: &str) -> PublishDate {
    let s = raw.trim();
    if s.is_empty() {
        return PublishDate::Unknown;
    }

    let parsers: [fn(&str) -> Option<NaiveDateTime>; 7] = [
        rfc822_named_zone,
        rfc822_numeric_offset,
        iso_with_offset,
        iso_naive,
        plain_day,
        short_month_day,
        long_month_day,
    ];
    if let Some(dt) = parsers.iter().find_map(|parse| parse(s)) {
        return PublishDate::Known(dt);
    }

    ISO_PREFIX
        .captures(s)
        .and_then(|caps| {
            let joined = format!("{} {}", &caps[1], &caps[2]);
            NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S").ok()
        })
        .map_or(PublishDate::Unknown, PublishDate::Known)
}

const NAMED_ZONES: [&str; 4] = ["GMT", "UTC", "UT", "Z"];

// "Tue, 13 Oct 2026 14:05:00 GMT"
fn rfc822_named_zone(s: &str) -> Option<NaiveDateTime> {
    let (head, zone) = s.rsplit_once(' ')?;
    if !NAMED_ZONES.contains(&zone) {
        return None;
    }
    NaiveDateTime::parse_from_str(without_weekday(head)?, "%d %b %Y %H:%M:%S").ok()
}

// "Tue, 13 Oct 2026 14:05:00 +0200"
fn rfc822_numeric_offset(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_str(without_weekday(s)?, "%d %b %Y %H:%M:%S %z")
        .ok()
        .map(|dt| dt.naive_local())
}

/// Drop the leading `"<Day>, "`. The weekday name is not checked against
/// the calendar date; feeds occasionally get it wrong.
fn without_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(", ")?;
    if day.is_empty() || !day.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(rest)
}

// "2026-10-13T14:05:00+02:00", "2026-10-13T14:05:00Z"
fn iso_with_offset(s: &str) -> Option<NaiveDateTime> {
    let s = match s.strip_suffix('Z') {
        Some(head) => format!("{head}+0000"),
        None => s.to_string(),
    };
    DateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%z")
        .ok()
        .map(|dt| dt.naive_local())
}

fn iso_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok()
}

fn plain_day(s: &str) -> Option<NaiveDateTime> {
    day_start(NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?)
}

// "Oct 13, 2026"
fn short_month_day(s: &str) -> Option<NaiveDateTime> {
    day_start(NaiveDate::parse_from_str(s, "%b %d, %Y").ok()?)
}

// "October 13, 2026"
fn long_month_day(s: &str) -> Option<NaiveDateTime> {
    day_start(NaiveDate::parse_from_str(s, "%B %d, %Y").ok()?)
}

fn day_start(d: NaiveDate) -> Option<NaiveDateTime> {
    d.and_hms_opt(0, 0, 0)
}
