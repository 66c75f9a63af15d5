//! Property tests for aggregation and search over generated entries.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use feedsift::corpus::{Corpus, DedupKey};
use feedsift::search::{search_corpus, FieldSelector, MatchMode, SearchSpec};
use feedsift::{Entry, FeedRef};
use proptest::prelude::*;

fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        "[a-cA-C ]{0,8}",
        "[a-c ]{0,12}",
        prop_oneof![
            Just(String::new()),
            Just("https://example.com/1".to_string()),
            Just("https://EXAMPLE.com/1".to_string()),
            Just("https://example.com/2".to_string()),
            Just("not a url".to_string()),
        ],
        proptest::option::of(0i64..5),
        1i64..4,
    )
        .prop_map(|(title, description, link, day, feed)| Entry {
            title,
            description,
            link,
            published: day.map(|d| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(d)),
            source: FeedRef::new(feed, format!("https://feed{}.example.com/rss", feed)),
        })
}

fn arb_field() -> impl Strategy<Value = FieldSelector> {
    prop_oneof![
        Just(FieldSelector::Title),
        Just(FieldSelector::Description),
        Just(FieldSelector::Both),
    ]
}

fn arb_mode() -> impl Strategy<Value = MatchMode> {
    prop_oneof![Just(MatchMode::Any), Just(MatchMode::All)]
}

fn fields(entry: &Entry, field: FieldSelector) -> Vec<String> {
    let mut out = Vec::new();
    if field.includes_title() {
        out.push(entry.title.to_lowercase());
    }
    if field.includes_description() {
        out.push(entry.description.to_lowercase());
    }
    out
}

proptest! {
    #[test]
    fn corpus_has_unique_keys(entries in proptest::collection::vec(arb_entry(), 0..40)) {
        let corpus = Corpus::from_entries(entries);
        let mut seen = HashSet::new();
        for entry in corpus.entries() {
            prop_assert!(seen.insert(DedupKey::for_entry(entry)));
        }
    }

    #[test]
    fn corpus_is_idempotent(entries in proptest::collection::vec(arb_entry(), 0..40)) {
        let once = Corpus::from_entries(entries);
        let twice = Corpus::from_entries(once.entries().to_vec());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn corpus_is_newest_first_with_undated_last(entries in proptest::collection::vec(arb_entry(), 0..40)) {
        let corpus = Corpus::from_entries(entries);
        for pair in corpus.entries().windows(2) {
            match (pair[0].published, pair[1].published) {
                (Some(a), Some(b)) => prop_assert!(a >= b),
                (None, Some(_)) => prop_assert!(false, "undated entry before dated one"),
                _ => {}
            }
        }
    }

    #[test]
    fn matches_honor_mode(
        entries in proptest::collection::vec(arb_entry(), 0..40),
        keywords in proptest::collection::vec("[a-c]{1,2}", 1..4),
        field in arb_field(),
        mode in arb_mode(),
    ) {
        let corpus = Corpus::from_entries(entries);
        let spec = SearchSpec::new(&keywords, field, mode, 0);
        let hits = search_corpus(&corpus, &spec);

        let satisfies = |entry: &Entry| {
            let haystacks = fields(entry, field);
            let found = |k: &String| haystacks.iter().any(|h| h.contains(k.as_str()));
            match mode {
                MatchMode::Any => keywords.iter().any(found),
                MatchMode::All => keywords.iter().all(found),
            }
        };

        for entry in &hits.entries {
            prop_assert!(satisfies(entry));
        }
        let expected = corpus.entries().iter().filter(|&e| satisfies(e)).count();
        prop_assert_eq!(hits.total_matches, expected);
    }

    #[test]
    fn truncation_takes_prefix(
        entries in proptest::collection::vec(arb_entry(), 0..40),
        keyword in "[a-c]",
        max in 1usize..6,
    ) {
        let corpus = Corpus::from_entries(entries);
        let full = search_corpus(
            &corpus,
            &SearchSpec::new([&keyword], FieldSelector::Both, MatchMode::Any, 0),
        );
        let capped = search_corpus(
            &corpus,
            &SearchSpec::new([&keyword], FieldSelector::Both, MatchMode::Any, max),
        );

        prop_assert_eq!(capped.total_matches, full.total_matches);
        let n = max.min(full.entries.len());
        prop_assert_eq!(&capped.entries[..], &full.entries[..n]);
    }
}
