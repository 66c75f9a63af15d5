use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::types::{FailureKind, FeedRef};

/// Default per-feed budget covering connect, headers and body
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Default cap on simultaneous in-flight requests
pub const DEFAULT_MAX_CONCURRENT: usize = 10;
/// Default response body cap (10MB)
pub const DEFAULT_MAX_FEED_BYTES: usize = 10 * 1024 * 1024;

/// Identifying User-Agent sent with every feed request
pub const DEFAULT_USER_AGENT: &str = concat!("feedsift/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while retrieving one feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// No complete response within the per-feed budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// 2xx response whose body is empty or whitespace only
    #[error("Empty response body")]
    EmptyResponse,
    /// Response body exceeded the size limit
    #[error("Response too large (limit {limit} bytes)")]
    ResponseTooLarge { limit: usize },
}

impl FetchError {
    /// Maps the error onto the reported failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::ResponseTooLarge { .. } => {
                FailureKind::NetworkError
            }
            FetchError::HttpStatus(_) => FailureKind::HttpError,
            FetchError::EmptyResponse => FailureKind::EmptyResponse,
        }
    }
}

/// Tunables for a fetch cycle.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_concurrent: usize,
    pub max_body_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_body_bytes: DEFAULT_MAX_FEED_BYTES,
        }
    }
}

/// Outcome of fetching a single feed: exactly one per requested feed.
#[derive(Debug)]
pub enum FetchOutcome {
    Success { feed: FeedRef, body: Vec<u8> },
    Failure { feed: FeedRef, error: FetchError },
}

impl FetchOutcome {
    pub fn feed(&self) -> &FeedRef {
        match self {
            FetchOutcome::Success { feed, .. } | FetchOutcome::Failure { feed, .. } => feed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Builds the HTTP client used for feed requests.
///
/// The client carries the identifying User-Agent and a request timeout equal
/// to the per-feed budget; [`fetch_one`] additionally enforces that budget
/// over the whole exchange including the body.
pub fn build_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
}

/// Fetches every feed concurrently and returns one outcome per feed, in input order.
///
/// Up to `options.max_concurrent` requests are in flight at once; the rest
/// wait for a free slot. Each feed gets exactly one attempt bounded by
/// `options.timeout`. A failing or hanging feed only affects its own outcome.
///
/// Completion order is not observable in the result: outcomes are put back
/// into the order of `feeds` before returning.
pub async fn fetch_all(
    client: &reqwest::Client,
    feeds: &[FeedRef],
    options: &FetchOptions,
) -> Vec<FetchOutcome> {
    if feeds.is_empty() {
        return Vec::new();
    }

    let total = feeds.len();
    let limit = options.max_concurrent.max(1);
    let completed = Arc::new(AtomicUsize::new(0));

    let mut indexed: Vec<(usize, FetchOutcome)> = stream::iter(feeds.iter().cloned().enumerate())
        .map(|(index, feed)| {
            let completed = completed.clone();
            async move {
                let outcome = match fetch_one(client, &feed, options).await {
                    Ok(body) => FetchOutcome::Success { feed, body },
                    Err(error) => FetchOutcome::Failure { feed, error },
                };
                let done = completed.fetch_add(1, Ordering::Relaxed).saturating_add(1);
                tracing::trace!(done = done, total = total, "Fetch settled");
                (index, outcome)
            }
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    indexed.sort_unstable_by_key(|(index, _)| *index);

    let failed = indexed.iter().filter(|(_, o)| !o.is_success()).count();
    tracing::info!(
        total = total,
        failed = failed,
        concurrency = limit,
        "Fetch cycle complete"
    );

    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Fetches one feed body.
///
/// # Errors
///
/// - [`FetchError::Timeout`] - no complete response within `options.timeout`
/// - [`FetchError::Network`] - connection, DNS or TLS failure
/// - [`FetchError::HttpStatus`] - non-2xx response
/// - [`FetchError::ResponseTooLarge`] - body exceeded `options.max_body_bytes`
/// - [`FetchError::EmptyResponse`] - body empty or whitespace only
pub async fn fetch_one(
    client: &reqwest::Client,
    feed: &FeedRef,
    options: &FetchOptions,
) -> Result<Vec<u8>, FetchError> {
    let exchange = async {
        let response = client.get(&feed.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, options.max_body_bytes).await
    };

    let result = match tokio::time::timeout(options.timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(options.timeout)),
    };

    match result {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
            tracing::warn!(feed = %feed.url, "Feed returned an empty body");
            Err(FetchError::EmptyResponse)
        }
        Ok(bytes) => {
            tracing::debug!(feed = %feed.url, bytes = bytes.len(), "Fetched feed");
            Ok(bytes)
        }
        Err(e) => {
            tracing::warn!(feed = %feed.url, kind = %e.kind(), error = %e, "Feed fetch failed");
            Err(e)
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge { limit });
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
