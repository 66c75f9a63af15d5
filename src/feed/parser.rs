use feed_rs::model::{self, Link};
use feed_rs::parser::Builder;
use thiserror::Error;

use super::dates::parse_timestamp;
use super::format::{detect_format, Detection, FeedFormat};
use super::types::{Entry, FeedRef};
use crate::util::normalize_text;

/// Errors that make a fetched body unusable as a feed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is XML, but its root is not `rss`, `RDF` or `feed`
    #[error("not an RSS or Atom document (root element <{0}>)")]
    UnknownRoot(String),
    /// No XML root element could be read at all
    #[error("not an XML document: {0}")]
    NotXml(String),
    /// Recognized as RSS/Atom but the feed parser rejected it
    #[error("malformed {format} feed: {reason}")]
    Malformed { format: FeedFormat, reason: String },
}

/// A successfully parsed feed document.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub format: FeedFormat,
    /// Channel/feed title, if present and non-empty
    pub title: Option<String>,
    pub description: Option<String>,
    /// Items in document order
    pub entries: Vec<Entry>,
}

/// Parses a fetched body into normalized entries.
///
/// The variant is chosen by inspecting the root element (see
/// [`detect_format`]); the document is then handed to `feed-rs` with the
/// lenient [`parse_timestamp`] for dates.
///
/// Normalization per entry:
/// - missing title or description becomes an empty string
/// - description falls back to the content body when there is no summary
/// - published falls back to updated; unreadable dates leave the entry undated
/// - all text is NFC-normalized and trimmed, markup is kept as-is
///
/// A feed with no items is a success with an empty entry list.
///
/// # Errors
///
/// Returns [`ParseError`] when the body is not an RSS/Atom document or the
/// recognized document cannot be parsed.
pub fn parse_feed(bytes: &[u8], source: &FeedRef) -> Result<ParsedFeed, ParseError> {
    let format = match detect_format(bytes) {
        Detection::Feed(format) => format,
        Detection::UnknownRoot(root) => return Err(ParseError::UnknownRoot(root)),
        Detection::NotXml(reason) => return Err(ParseError::NotXml(reason)),
    };

    let parser = Builder::new().timestamp_parser(parse_timestamp).build();
    let feed = parser.parse(bytes).map_err(|e| ParseError::Malformed {
        format,
        reason: e.to_string(),
    })?;

    let entries: Vec<Entry> = feed
        .entries
        .into_iter()
        .map(|entry| normalize_entry(entry, source))
        .collect();

    let undated = entries.iter().filter(|e| e.published.is_none()).count();
    tracing::debug!(
        feed = %source.url,
        format = %format,
        entries = entries.len(),
        undated = undated,
        "Parsed feed"
    );

    Ok(ParsedFeed {
        format,
        title: feed.title.map(|t| normalize_text(&t.content)).filter(|t| !t.is_empty()),
        description: feed
            .description
            .map(|d| normalize_text(&d.content))
            .filter(|d| !d.is_empty()),
        entries,
    })
}

fn normalize_entry(entry: model::Entry, source: &FeedRef) -> Entry {
    let title = entry
        .title
        .map(|t| normalize_text(&t.content))
        .unwrap_or_default();
    let description = entry
        .summary
        .map(|s| s.content)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.and_then(|c| c.body))
        .map(|s| normalize_text(&s))
        .unwrap_or_default();
    let link = pick_link(&entry.links)
        .map(|l| normalize_text(&l.href))
        .unwrap_or_default();

    Entry {
        title,
        description,
        link,
        published: entry.published.or(entry.updated),
        source: source.clone(),
    }
}

/// Prefers the article link (`rel` absent or `alternate`) over enclosures,
/// `self` links and the like; falls back to the first link.
fn pick_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
}
