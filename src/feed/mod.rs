//! Feed retrieval and normalization.
//!
//! - [`fetcher`] - bounded-concurrency HTTP retrieval with a per-feed timeout
//! - [`format`] - RSS vs Atom detection from the document root
//! - [`parser`] - `feed-rs` based parsing into normalized [`Entry`] values
//! - [`dates`] - lenient timestamp parsing shared by all formats
//!
//! # Example
//!
//! ```ignore
//! use feedsift::feed::{build_client, fetch_all, parse_feed, FetchOptions, FetchOutcome};
//!
//! let client = build_client(DEFAULT_USER_AGENT, options.timeout)?;
//! for outcome in fetch_all(&client, &feeds, &options).await {
//!     if let FetchOutcome::Success { feed, body } = outcome {
//!         let parsed = parse_feed(&body, &feed)?;
//!     }
//! }
//! ```

mod dates;
mod fetcher;
mod format;
mod parser;
mod types;

pub use dates::parse_timestamp;
pub use fetcher::{
    build_client, fetch_all, fetch_one, FetchError, FetchOptions, FetchOutcome,
    DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_FEED_BYTES, DEFAULT_USER_AGENT,
};
pub use format::{detect_format, Detection, FeedFormat};
pub use parser::{parse_feed, ParseError, ParsedFeed};
pub use types::{Entry, FailureKind, FeedFailure, FeedRef};
