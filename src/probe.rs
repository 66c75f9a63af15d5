//! Single-feed validation: fetch and parse one feed without aggregating.
//!
//! Used before a feed is registered, to tell the caller whether the URL
//! actually serves an RSS or Atom document.

use serde::Serialize;

use crate::feed::{fetch_one, parse_feed, FailureKind, FeedFormat, FeedRef, FetchOptions};

/// Why a probed feed was judged invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Structural validity report for one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub feed: FeedRef,
    pub valid: bool,
    pub format: Option<FeedFormat>,
    pub feed_title: Option<String>,
    pub feed_description: Option<String>,
    pub entry_count: usize,
    pub first_entry_title: Option<String>,
    /// Present exactly when `valid` is false
    pub failure: Option<ProbeFailure>,
}

impl ValidationReport {
    fn invalid(feed: &FeedRef, kind: FailureKind, message: String) -> Self {
        Self {
            feed: feed.clone(),
            valid: false,
            format: None,
            feed_title: None,
            feed_description: None,
            entry_count: 0,
            first_entry_title: None,
            failure: Some(ProbeFailure { kind, message }),
        }
    }
}

/// Fetches and parses `feed`, reporting the first failure or a summary.
///
/// A feed with zero entries is structurally valid. Never fails: every
/// problem is encoded in the returned report.
pub async fn probe_feed(
    client: &reqwest::Client,
    feed: &FeedRef,
    options: &FetchOptions,
) -> ValidationReport {
    let body = match fetch_one(client, feed, options).await {
        Ok(body) => body,
        Err(e) => return ValidationReport::invalid(feed, e.kind(), e.to_string()),
    };

    let parsed = match parse_feed(&body, feed) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::info!(feed = %feed.url, error = %e, "Probe: not a valid feed");
            return ValidationReport::invalid(feed, FailureKind::ParseError, e.to_string());
        }
    };

    let first_entry_title = parsed
        .entries
        .first()
        .map(|e| e.title.clone())
        .filter(|t| !t.is_empty());

    tracing::info!(
        feed = %feed.url,
        format = %parsed.format,
        entries = parsed.entries.len(),
        "Probe: feed is valid"
    );

    ValidationReport {
        feed: feed.clone(),
        valid: true,
        format: Some(parsed.format),
        feed_title: parsed.title,
        feed_description: parsed.description,
        entry_count: parsed.entries.len(),
        first_entry_title,
        failure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{build_client, DEFAULT_USER_AGENT};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Probe Feed</title>
    <subtitle>Testing the probe</subtitle>
    <id>urn:example:probe</id>
    <updated>2024-02-01T00:00:00Z</updated>
    <entry>
        <title>First post</title>
        <id>urn:example:probe:1</id>
        <link href="https://example.com/1"/>
        <updated>2024-02-01T00:00:00Z</updated>
    </entry>
    <entry>
        <title>Second post</title>
        <id>urn:example:probe:2</id>
        <link href="https://example.com/2"/>
        <updated>2024-01-01T00:00:00Z</updated>
    </entry>
</feed>"#;

    async fn serve(template: ResponseTemplate) -> (MockServer, FeedRef) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        let feed = FeedRef::new(0, format!("{}/feed", mock_server.uri()));
        (mock_server, feed)
    }

    fn client() -> reqwest::Client {
        build_client(DEFAULT_USER_AGENT, Duration::from_secs(10)).unwrap()
    }

    #[tokio::test]
    async fn test_probe_valid_atom() {
        let (_server, feed) = serve(ResponseTemplate::new(200).set_body_string(ATOM)).await;

        let report = probe_feed(&client(), &feed, &FetchOptions::default()).await;

        assert!(report.valid);
        assert_eq!(report.format, Some(FeedFormat::Atom));
        assert_eq!(report.entry_count, 2);
        assert_eq!(report.first_entry_title.as_deref(), Some("First post"));
        assert_eq!(report.feed_title.as_deref(), Some("Probe Feed"));
        assert_eq!(report.feed_description.as_deref(), Some("Testing the probe"));
        assert_eq!(report.failure, None);
    }

    #[tokio::test]
    async fn test_probe_empty_channel_is_valid() {
        let body = r#"<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;
        let (_server, feed) = serve(ResponseTemplate::new(200).set_body_string(body)).await;

        let report = probe_feed(&client(), &feed, &FetchOptions::default()).await;

        assert!(report.valid);
        assert_eq!(report.entry_count, 0);
        assert_eq!(report.first_entry_title, None);
    }

    #[tokio::test]
    async fn test_probe_http_error() {
        let (_server, feed) = serve(ResponseTemplate::new(503)).await;

        let report = probe_feed(&client(), &feed, &FetchOptions::default()).await;

        assert!(!report.valid);
        let failure = report.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::HttpError);
        assert!(failure.message.contains("503"));
    }

    #[tokio::test]
    async fn test_probe_html_page_is_parse_error() {
        let (_server, feed) = serve(
            ResponseTemplate::new(200).set_body_string("<html><body>hello</body></html>"),
        )
        .await;

        let report = probe_feed(&client(), &feed, &FetchOptions::default()).await;

        assert!(!report.valid);
        assert_eq!(report.entry_count, 0);
        assert_eq!(report.failure.map(|f| f.kind), Some(FailureKind::ParseError));
    }

    #[tokio::test]
    async fn test_probe_empty_body() {
        let (_server, feed) = serve(ResponseTemplate::new(200)).await;

        let report = probe_feed(&client(), &feed, &FetchOptions::default()).await;

        assert_eq!(
            report.failure.map(|f| f.kind),
            Some(FailureKind::EmptyResponse)
        );
    }
}
