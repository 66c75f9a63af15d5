//! Aggregation of parsed entries into one deduplicated, chronological corpus.
//!
//! Building a corpus is pure: the same input sequence always yields the same
//! entries in the same order. Encounter order (feed input order, then item
//! order within a feed) decides which duplicate survives and how undated
//! entries are ordered among themselves.

use std::cmp::Ordering;
use std::collections::HashSet;

use url::Url;

use crate::feed::{Entry, FeedRef};
use crate::util::{fold_for_match, to_nfc};

/// Identity used to recognize the same article seen more than once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Canonical form of a non-empty link
    Link(String),
    /// Case-folded title scoped to its source feed, for link-less entries
    TitleInFeed { title: String, feed: FeedRef },
}

impl DedupKey {
    pub fn for_entry(entry: &Entry) -> Self {
        let link = entry.link.trim();
        if link.is_empty() {
            DedupKey::TitleInFeed {
                title: fold_for_match(entry.title.trim()),
                feed: entry.source.clone(),
            }
        } else {
            DedupKey::Link(canonical_link(link))
        }
    }
}

/// Canonicalizes a link for comparison.
///
/// Absolute URLs go through `url` parsing, which lowercases the scheme and
/// host and drops default ports. Anything else is compared as NFC text.
fn canonical_link(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) => url.into(),
        Err(_) => to_nfc(link).into_owned(),
    }
}

/// Ordering used for the corpus: dated entries newest first, undated after.
///
/// Undated entries compare equal to each other, so a stable sort keeps their
/// encounter order.
pub fn newest_first(a: &Entry, b: &Entry) -> Ordering {
    match (a.published, b.published) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Deduplicated entries from every feed of one call, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    entries: Vec<Entry>,
}

impl Corpus {
    /// Builds a corpus from entries given in encounter order.
    ///
    /// The first entry seen for each [`DedupKey`] is kept; later ones are
    /// dropped. The survivors are then stably sorted with [`newest_first`].
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut seen = HashSet::new();
        let mut duplicates = 0usize;

        let mut kept: Vec<Entry> = entries
            .into_iter()
            .filter(|entry| {
                let fresh = seen.insert(DedupKey::for_entry(entry));
                if !fresh {
                    duplicates += 1;
                }
                fresh
            })
            .collect();

        // slice::sort_by is stable
        kept.sort_by(newest_first);

        tracing::debug!(
            entries = kept.len(),
            duplicates = duplicates,
            "Corpus built"
        );

        Self { entries: kept }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn feed(id: i64) -> FeedRef {
        FeedRef::new(id, format!("https://feed{id}.example.com/rss"))
    }

    fn at(day: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap())
    }

    fn entry(title: &str, link: &str, published: Option<DateTime<Utc>>, source: i64) -> Entry {
        Entry {
            title: title.to_string(),
            description: String::new(),
            link: link.to_string(),
            published,
            source: feed(source),
        }
    }

    fn titles(corpus: &Corpus) -> Vec<&str> {
        corpus.entries().iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn test_same_link_across_feeds_keeps_first() {
        let corpus = Corpus::from_entries(vec![
            entry("from A", "https://example.com/post", at(1), 1),
            entry("from B", "https://example.com/post", at(2), 2),
        ]);
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.entries()[0].title, "from A");
        assert_eq!(corpus.entries()[0].source.id, 1);
    }

    #[test]
    fn test_link_canonicalization() {
        let corpus = Corpus::from_entries(vec![
            entry("one", "HTTPS://Example.COM:443/post", at(1), 1),
            entry("two", "https://example.com/post", at(1), 2),
            entry("three", " https://example.com/post ", at(1), 3),
        ]);
        assert_eq!(titles(&corpus), vec!["one"]);
    }

    #[test]
    fn test_link_path_case_matters() {
        let corpus = Corpus::from_entries(vec![
            entry("lower", "https://example.com/post", at(1), 1),
            entry("upper", "https://example.com/POST", at(1), 1),
        ]);
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_linkless_entries_keyed_by_title_within_feed() {
        let corpus = Corpus::from_entries(vec![
            entry("Weekly Notes", "", None, 1),
            entry("weekly notes", "", None, 1),
            entry("Weekly Notes", "", None, 2),
        ]);
        // Same folded title in feed 1 collapses; feed 2 keeps its own copy
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.entries()[0].source.id, 1);
        assert_eq!(corpus.entries()[1].source.id, 2);
    }

    #[test]
    fn test_sorted_newest_first_with_undated_last() {
        let corpus = Corpus::from_entries(vec![
            entry("undated-1", "https://e.com/u1", None, 1),
            entry("old", "https://e.com/old", at(1), 1),
            entry("undated-2", "https://e.com/u2", None, 2),
            entry("new", "https://e.com/new", at(20), 2),
            entry("mid", "https://e.com/mid", at(10), 1),
        ]);
        assert_eq!(
            titles(&corpus),
            vec!["new", "mid", "old", "undated-1", "undated-2"]
        );
    }

    #[test]
    fn test_equal_timestamps_keep_encounter_order() {
        let corpus = Corpus::from_entries(vec![
            entry("first", "https://e.com/1", at(5), 2),
            entry("second", "https://e.com/2", at(5), 1),
        ]);
        assert_eq!(titles(&corpus), vec!["first", "second"]);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let corpus = Corpus::from_entries(vec![
            entry("a", "https://e.com/a", at(3), 1),
            entry("b", "", None, 1),
            entry("c", "https://e.com/a", at(9), 2),
            entry("d", "https://e.com/d", at(7), 2),
        ]);
        let again = Corpus::from_entries(corpus.clone().into_entries());
        assert_eq!(corpus, again);
    }

    #[test]
    fn test_empty_input() {
        let corpus = Corpus::from_entries(Vec::new());
        assert!(corpus.is_empty());
    }
}
