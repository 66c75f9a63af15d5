//! The fetch → parse → aggregate → search cycle.
//!
//! An [`Engine`] owns only an HTTP client and fetch tunables. Every call
//! starts from the feed list it is given and keeps nothing afterwards, so
//! two calls never share entries.

use chrono::Utc;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::feed::{
    build_client, fetch_all, parse_feed, FeedFailure, FeedRef, FetchOptions, FetchOutcome,
    FailureKind,
};
use crate::probe::{probe_feed, ValidationReport};
use crate::search::{search_corpus, SearchRequest, SearchResult, SearchSpec, SpecError};

/// Corpus of one call plus the feeds that did not make it in.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub corpus: Corpus,
    /// In feed input order
    pub failures: Vec<FeedFailure>,
}

/// Feed aggregation and search engine.
#[derive(Debug, Clone)]
pub struct Engine {
    client: reqwest::Client,
    options: FetchOptions,
}

impl Engine {
    /// Builds an engine with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialized.
    pub fn new(user_agent: &str, options: FetchOptions) -> reqwest::Result<Self> {
        let client = build_client(user_agent, options.timeout)?;
        Ok(Self { client, options })
    }

    /// Builds an engine from the loaded configuration.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(&config.user_agent, config.fetch_options())
    }

    /// Fetches and parses every feed, then merges the entries into one corpus.
    ///
    /// Fetch and parse failures are collected per feed, never propagated.
    /// Entries are merged in feed input order, which is what deduplication
    /// and the undated tie-break see, independent of network timing.
    pub async fn aggregate(&self, feeds: &[FeedRef]) -> Aggregation {
        let outcomes = fetch_all(&self.client, feeds, &self.options).await;
        debug_assert_eq!(outcomes.len(), feeds.len());

        let mut failures = Vec::new();
        let mut batches = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            match outcome {
                FetchOutcome::Success { feed, body } => match parse_feed(&body, &feed) {
                    Ok(parsed) => batches.push(parsed.entries),
                    Err(e) => {
                        tracing::warn!(feed = %feed.url, error = %e, "Feed could not be parsed");
                        failures.push(FeedFailure {
                            feed,
                            kind: FailureKind::ParseError,
                            message: e.to_string(),
                        });
                    }
                },
                FetchOutcome::Failure { feed, error } => failures.push(FeedFailure {
                    kind: error.kind(),
                    message: error.to_string(),
                    feed,
                }),
            }
        }

        let corpus = Corpus::from_entries(batches.into_iter().flatten());

        tracing::info!(
            feeds = feeds.len(),
            failed = failures.len(),
            entries = corpus.len(),
            "Aggregation complete"
        );

        Aggregation { corpus, failures }
    }

    /// Runs a full search cycle for a validated spec.
    ///
    /// Always returns a best-effort result: feeds that failed are listed in
    /// `failed_feeds` and everything else is searched. An empty feed list
    /// yields an empty result, and so does a spec without keywords, in which
    /// case nothing is fetched.
    pub async fn search(&self, feeds: &[FeedRef], spec: &SearchSpec) -> SearchResult {
        if spec.is_degenerate() {
            tracing::debug!(feeds = feeds.len(), "No keywords, skipping fetch");
            return SearchResult {
                entries: Vec::new(),
                total_matches: 0,
                failed_feeds: Vec::new(),
                total_feeds: feeds.len(),
                search_params: spec.clone(),
                generated_at: Utc::now(),
            };
        }

        let Aggregation { corpus, failures } = self.aggregate(feeds).await;
        let hits = search_corpus(&corpus, spec);

        tracing::info!(
            keywords = spec.keywords().len(),
            matches = hits.total_matches,
            returned = hits.entries.len(),
            failed = failures.len(),
            "Search complete"
        );

        SearchResult {
            entries: hits.entries,
            total_matches: hits.total_matches,
            failed_feeds: failures,
            total_feeds: feeds.len(),
            search_params: spec.clone(),
            generated_at: Utc::now(),
        }
    }

    /// Validates a raw request and runs it.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] (`invalid_specification`) before any feed is
    /// fetched when the field, mode or result cap is malformed. A keyword
    /// string with no keywords in it is not an error.
    pub async fn search_request(
        &self,
        feeds: &[FeedRef],
        request: &SearchRequest,
    ) -> Result<SearchResult, SpecError> {
        let spec = SearchSpec::try_from(request).inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected search request");
        })?;
        Ok(self.search(feeds, &spec).await)
    }

    /// Fetches and parses a single feed for validation; see [`probe_feed`].
    pub async fn validate(&self, feed: &FeedRef) -> ValidationReport {
        probe_feed(&self.client, feed, &self.options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::DEFAULT_USER_AGENT;
    use crate::search::{FieldSelector, MatchMode};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link, date)| {
                format!("<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate></item>")
            })
            .collect();
        format!(r#"<?xml version="1.0"?><rss version="2.0"><channel>{body}</channel></rss>"#)
    }

    fn engine() -> Engine {
        Engine::new(
            DEFAULT_USER_AGENT,
            FetchOptions {
                timeout: Duration::from_millis(500),
                ..FetchOptions::default()
            },
        )
        .unwrap()
    }

    async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_aggregate_merges_and_reports_failures() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/a",
            ResponseTemplate::new(200).set_body_string(rss(&[
                ("Shared", "https://example.com/shared", "Mon, 01 Jan 2024 00:00:00 GMT"),
                ("Only A", "https://example.com/a", "Tue, 02 Jan 2024 00:00:00 GMT"),
            ])),
        )
        .await;
        mount(
            &server,
            "/b",
            ResponseTemplate::new(200).set_body_string(rss(&[(
                "Shared again",
                "https://example.com/shared",
                "Wed, 03 Jan 2024 00:00:00 GMT",
            )])),
        )
        .await;
        mount(&server, "/html", ResponseTemplate::new(200).set_body_string("<html/>")).await;
        mount(&server, "/gone", ResponseTemplate::new(410)).await;

        let feeds = vec![
            FeedRef::new(1, format!("{}/a", server.uri())),
            FeedRef::new(2, format!("{}/gone", server.uri())),
            FeedRef::new(3, format!("{}/b", server.uri())),
            FeedRef::new(4, format!("{}/html", server.uri())),
        ];

        let Aggregation { corpus, failures } = engine().aggregate(&feeds).await;

        let titles: Vec<&str> = corpus.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Only A", "Shared"]);

        let failed: Vec<(i64, FailureKind)> =
            failures.iter().map(|f| (f.feed.id, f.kind)).collect();
        assert_eq!(
            failed,
            vec![(2, FailureKind::HttpError), (4, FailureKind::ParseError)]
        );
    }

    #[tokio::test]
    async fn test_search_request_rejected_before_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let feeds = vec![FeedRef::new(1, format!("{}/a", server.uri()))];
        let request = SearchRequest {
            keywords: "rust".into(),
            mode: "sometimes".into(),
            ..SearchRequest::default()
        };

        let result = engine().search_request(&feeds, &request).await;
        assert_eq!(
            result.unwrap_err(),
            SpecError::UnknownMode("sometimes".into())
        );
    }

    #[tokio::test]
    async fn test_blank_keywords_yield_empty_result_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let feeds = vec![FeedRef::new(1, format!("{}/a", server.uri()))];
        let request = SearchRequest {
            keywords: " , \n ".into(),
            ..SearchRequest::default()
        };

        let result = engine().search_request(&feeds, &request).await.unwrap();
        assert!(result.entries.is_empty());
        assert_eq!(result.total_matches, 0);
        assert!(result.failed_feeds.is_empty());
        assert_eq!(result.total_feeds, 1);
    }

    #[tokio::test]
    async fn test_search_with_no_feeds_is_empty() {
        let spec = SearchSpec::new(["rust"], FieldSelector::Both, MatchMode::Any, 0);
        let result = engine().search(&[], &spec).await;
        assert!(result.entries.is_empty());
        assert_eq!(result.total_matches, 0);
        assert_eq!(result.total_feeds, 0);
        assert!(result.failed_feeds.is_empty());
    }
}
