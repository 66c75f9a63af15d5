use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Feed Reference
// ============================================================================

/// A feed as handed to the engine by the store: identifier plus URL.
///
/// The engine only ever sees snapshots of these; it never writes them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedRef {
    pub id: i64,
    pub url: String,
}

impl FeedRef {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One normalized item from an RSS or Atom feed.
///
/// Text fields are NFC-normalized and trimmed at parse time. `description`
/// may contain markup; nothing is stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub title: String,
    pub description: String,
    pub link: String,
    /// `None` when the feed gave no date or one no supported format could read
    pub published: Option<DateTime<Utc>>,
    pub source: FeedRef,
}

impl Entry {
    /// Host part of the entry link, e.g. `example.com`, if the link parses as a URL.
    pub fn source_host(&self) -> Option<String> {
        url::Url::parse(&self.link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

// ============================================================================
// Failures
// ============================================================================

/// Classification of a per-feed failure.
///
/// Feed-level failures are collected and reported next to whatever succeeded;
/// they never abort a search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, DNS, TLS, timeout or an oversized body
    NetworkError,
    /// Non-2xx HTTP status
    HttpError,
    /// 2xx response with nothing in the body
    EmptyResponse,
    /// Body is not an RSS or Atom document
    ParseError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NetworkError => "network_error",
            FailureKind::HttpError => "http_error",
            FailureKind::EmptyResponse => "empty_response",
            FailureKind::ParseError => "parse_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feed that could not contribute entries to a call, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedFailure {
    pub feed: FeedRef,
    pub kind: FailureKind,
    pub message: String,
}
