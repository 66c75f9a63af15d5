//! Keyword search over a [`Corpus`].
//!
//! Matching is substring containment after NFC normalization and
//! lowercasing; there is no tokenization, stemming or scoring. Results keep
//! corpus order, so they are chronological.
//!
//! Under [`FieldSelector::Both`] each keyword is looked up in the title and
//! in the description separately. In [`MatchMode::All`] one keyword may be
//! satisfied by the title and another by the description.

mod spec;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use spec::{
    parse_keywords, FieldSelector, MatchMode, SearchRequest, SearchSpec, SpecError,
    INVALID_SPECIFICATION,
};

use crate::corpus::Corpus;
use crate::feed::{Entry, FeedFailure};
use crate::util::fold_for_match;

/// Keyword matcher with keywords pre-folded for comparison.
#[derive(Debug, Clone)]
pub struct Matcher {
    keywords: Vec<String>,
    field: FieldSelector,
    mode: MatchMode,
}

impl Matcher {
    pub fn new(spec: &SearchSpec) -> Self {
        Self {
            keywords: spec.keywords().iter().map(|k| fold_for_match(k)).collect(),
            field: spec.field(),
            mode: spec.mode(),
        }
    }

    /// True if `entry` satisfies the keyword condition in the selected fields.
    ///
    /// An empty keyword list matches nothing.
    pub fn matches(&self, entry: &Entry) -> bool {
        if self.keywords.is_empty() {
            return false;
        }

        let title = self
            .field
            .includes_title()
            .then(|| fold_for_match(&entry.title));
        let description = self
            .field
            .includes_description()
            .then(|| fold_for_match(&entry.description));

        let found = |keyword: &String| {
            title.as_deref().is_some_and(|t| t.contains(keyword.as_str()))
                || description
                    .as_deref()
                    .is_some_and(|d| d.contains(keyword.as_str()))
        };

        match self.mode {
            MatchMode::Any => self.keywords.iter().any(found),
            MatchMode::All => self.keywords.iter().all(found),
        }
    }
}

/// Matches from one corpus before failures are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    /// At most `max_results` entries (all when 0), in corpus order
    pub entries: Vec<Entry>,
    /// Number of matching entries before truncation
    pub total_matches: usize,
}

/// Runs `spec` against `corpus`.
///
/// Every corpus entry is tested so `total_matches` is exact; only the first
/// `max_results` matches are kept.
pub fn search_corpus(corpus: &Corpus, spec: &SearchSpec) -> SearchHits {
    let matcher = Matcher::new(spec);
    let cap = spec.max_results();

    let mut hits = SearchHits::default();
    for entry in corpus.entries() {
        if !matcher.matches(entry) {
            continue;
        }
        hits.total_matches += 1;
        if cap == 0 || hits.entries.len() < cap {
            hits.entries.push(entry.clone());
        }
    }

    tracing::debug!(
        corpus = corpus.len(),
        matches = hits.total_matches,
        returned = hits.entries.len(),
        mode = %spec.mode(),
        field = %spec.field(),
        "Search evaluated"
    );

    hits
}

/// Complete answer to one search call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Matching entries, newest first, truncated to `max_results`
    pub entries: Vec<Entry>,
    /// Matching entries before truncation
    pub total_matches: usize,
    /// Feeds that could not be fetched or parsed during this call
    pub failed_feeds: Vec<FeedFailure>,
    /// Number of feeds the call was asked to search
    pub total_feeds: usize,
    pub search_params: SearchSpec,
    pub generated_at: DateTime<Utc>,
}
