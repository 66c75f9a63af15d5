//! Lenient timestamp parsing for feed dates.
//!
//! Feeds in the wild mix RFC 2822 (RSS), RFC 3339 (Atom) and a long tail of
//! homegrown formats: wrong weekdays, missing seconds, `UTC` instead of an
//! offset, or no zone at all. [`parse_timestamp`] tries the strict formats
//! first and then progressively looser ones. Anything it cannot read leaves
//! the entry undated rather than failing the feed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Zone names that appear in place of a numeric offset.
const ZONE_ALIASES: &[(&str, &str)] = &[
    ("UTC", "+0000"),
    ("GMT", "+0000"),
    ("UT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
];

/// RFC 2822-like layouts, applied after the weekday is removed and the zone
/// name is replaced by an offset.
const RFC2822_LIKE: &[&str] = &[
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%d %B %Y %H:%M:%S %z",
    "%d %b %y %H:%M:%S %z",
];

/// ISO 8601 layouts carrying an explicit offset.
const ISO_WITH_OFFSET: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Layouts without zone information; read as UTC.
const NAIVE_DATETIME: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_ONLY: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%B %d, %Y"];

/// Parses a feed timestamp in any of the supported formats.
///
/// Returns `None` for empty or unrecognized input.
///
/// # Examples
///
/// ```
/// use feedsift::feed::parse_timestamp;
///
/// assert!(parse_timestamp("Tue, 10 Jun 2003 04:00:00 GMT").is_some());
/// assert!(parse_timestamp("2024-01-15T10:30:00Z").is_some());
/// assert!(parse_timestamp("2024-01-15").is_some());
/// assert!(parse_timestamp("sometime last week").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let zoned = replace_zone_alias(strip_weekday(text));
    for layout in RFC2822_LIKE.iter().chain(ISO_WITH_OFFSET) {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, layout) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let bare = strip_weekday(text);
    for layout in NAIVE_DATETIME {
        if let Ok(naive) = NaiveDateTime::parse_from_str(bare, layout) {
            return Some(naive.and_utc());
        }
    }

    for layout in DATE_ONLY {
        if let Ok(date) = NaiveDate::parse_from_str(bare, layout) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    tracing::trace!(value = %text, "Unrecognized feed timestamp");
    None
}

/// Drops a leading `"Mon, "` style weekday. Publishers get it wrong often
/// enough that chrono's strict RFC 2822 check rejects otherwise valid dates.
fn strip_weekday(text: &str) -> &str {
    match text.split_once(',') {
        Some((head, rest)) if head.len() <= 9 && head.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest.trim_start()
        }
        _ => text,
    }
}

/// Replaces a trailing zone name (`GMT`, `EST`, a bare `Z` …) with its numeric offset.
fn replace_zone_alias(text: &str) -> String {
    if let Some(prefix) = text.strip_suffix(['Z', 'z']) {
        if prefix.ends_with(|c: char| c.is_ascii_digit()) {
            return format!("{prefix}+00:00");
        }
    }

    if let Some((head, zone)) = text.rsplit_once(' ') {
        if let Some((_, offset)) = ZONE_ALIASES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(zone))
        {
            return format!("{head} {offset}");
        }
    }

    text.to_string()
}
