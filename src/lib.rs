//! feedsift: concurrent RSS/Atom aggregation with keyword search.
//!
//! Every search fetches the registered feeds afresh, merges their entries
//! into a deduplicated, newest-first [`Corpus`] and filters it with a
//! validated [`SearchSpec`]. Feeds that fail are reported alongside the
//! results instead of failing the whole call.

pub mod config;
pub mod corpus;
pub mod engine;
pub mod feed;
pub mod probe;
pub mod search;
pub mod storage;
pub mod util;

pub use config::{Config, ConfigError};
pub use corpus::Corpus;
pub use engine::{Aggregation, Engine};
pub use feed::{Entry, FailureKind, FeedFailure, FeedRef, FetchOptions};
pub use probe::{ProbeFailure, ValidationReport};
pub use search::{FieldSelector, MatchMode, SearchRequest, SearchResult, SearchSpec, SpecError};
pub use storage::{Database, DatabaseError, StoredFeed};
