/// Behavioral suite shared by every store implementation
/// Both backends must answer each query identically for the same inserts

#[cfg(test)]
mod tests {
    use crate::core::store::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Macro to run a test function against a fresh instance of every store
    macro_rules! test_all_stores {
        ($test_fn:expr) => {
            $test_fn("Memory", &MemoryStore::new());
            #[cfg(feature = "sqlite")]
            $test_fn("Sqlite", &SqliteStore::open_in_memory("quotes").unwrap());
        };
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn add(store: &dyn QuoteStore, text: &str, quotee: &str, secs: u64) {
        store
            .insert(&Quote::new(text, quotee, "<@quoter>", at(secs)))
            .unwrap();
    }

    fn texts(quotes: &[Quote]) -> Vec<&str> {
        quotes.iter().map(|q| q.quote.as_str()).collect()
    }

    #[test]
    fn test_empty_store() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            assert_eq!(store.count(&Scope::All).unwrap(), 0, "{name}");
            assert!(
                store.latest(&Scope::All).unwrap_err().is_not_found(),
                "{name}: latest on empty store should be NotFound"
            );
            assert!(
                store.at_offset(0, &Scope::All).unwrap_err().is_not_found(),
                "{name}: offset 0 on empty store should be NotFound"
            );
            assert!(store.search("anything", 10).unwrap().is_empty(), "{name}");
            assert!(store.leaderboard_top(10).unwrap().is_empty(), "{name}");
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_latest_follows_insertion_order() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            add(store, "first", "<@a>", 0);
            add(store, "second", "<@b>", 1);
            add(store, "third", "<@a>", 2);

            assert_eq!(store.latest(&Scope::All).unwrap().quote, "third", "{name}");
            assert_eq!(
                store
                    .latest(&Scope::Quotee("<@b>".to_string()))
                    .unwrap()
                    .quote,
                "second",
                "{name}"
            );
            let missing = store
                .latest(&Scope::Quotee("<@nobody>".to_string()))
                .unwrap_err();
            assert_eq!(
                missing,
                QuoteError::NotFound {
                    scope: Scope::Quotee("<@nobody>".to_string())
                },
                "{name}"
            );
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_latest_ignores_created_at() {
        // Insertion order wins even when submission times arrive out of order
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            add(store, "submitted later", "<@a>", 100);
            add(store, "submitted earlier", "<@a>", 5);

            assert_eq!(
                store.latest(&Scope::All).unwrap().quote,
                "submitted earlier",
                "{name}"
            );
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_offsets_enumerate_in_insertion_order() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            for (i, quotee) in ["<@a>", "<@b>", "<@a>", "<@c>", "<@a>"].iter().enumerate() {
                add(store, &format!("q{i}"), quotee, i as u64);
            }

            let all: Vec<String> = (0..5)
                .map(|offset| store.at_offset(offset, &Scope::All).unwrap().quote)
                .collect();
            assert_eq!(all, ["q0", "q1", "q2", "q3", "q4"], "{name}");

            let scope = Scope::Quotee("<@a>".to_string());
            let scoped: Vec<String> = (0..3)
                .map(|offset| store.at_offset(offset, &scope).unwrap().quote)
                .collect();
            assert_eq!(scoped, ["q0", "q2", "q4"], "{name}");

            assert!(
                store.at_offset(5, &Scope::All).unwrap_err().is_not_found(),
                "{name}: offset past the end should be NotFound"
            );
            assert!(
                store.at_offset(3, &scope).unwrap_err().is_not_found(),
                "{name}: scoped offset past the end should be NotFound"
            );
            assert!(
                store
                    .at_offset(u64::MAX, &Scope::All)
                    .unwrap_err()
                    .is_not_found(),
                "{name}: huge offset should be NotFound"
            );
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_counts_are_exact() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            for i in 0..7 {
                let quotee = if i % 3 == 0 { "<@x>" } else { "<@y>" };
                add(store, &format!("quote {i}"), quotee, i);
            }

            assert_eq!(store.count(&Scope::All).unwrap(), 7, "{name}");
            assert_eq!(
                store.count(&Scope::Quotee("<@x>".to_string())).unwrap(),
                3,
                "{name}"
            );
            assert_eq!(
                store.count(&Scope::Quotee("<@y>".to_string())).unwrap(),
                4,
                "{name}"
            );
            assert_eq!(
                store.count(&Scope::Quotee("<@z>".to_string())).unwrap(),
                0,
                "{name}"
            );
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_search_is_literal_and_case_insensitive() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            add(store, "We gave 100% effort", "<@a>", 0);
            add(store, "a 100x engineer", "<@a>", 1);
            add(store, "snake_case forever", "<@b>", 2);
            add(store, "snakeXcase is weird", "<@b>", 3);
            add(store, "path C:\\temp", "<@c>", 4);
            add(store, "HELLO there", "<@c>", 5);

            assert_eq!(
                texts(&store.search("100%", 10).unwrap()),
                ["We gave 100% effort"],
                "{name}: % must match literally"
            );
            assert_eq!(
                texts(&store.search("snake_case", 10).unwrap()),
                ["snake_case forever"],
                "{name}: _ must match literally"
            );
            assert_eq!(
                texts(&store.search("C:\\", 10).unwrap()),
                ["path C:\\temp"],
                "{name}: backslash must match literally"
            );
            assert_eq!(
                texts(&store.search("hello", 10).unwrap()),
                ["HELLO there"],
                "{name}: ASCII case is ignored"
            );
            assert!(store.search("absent", 10).unwrap().is_empty(), "{name}");

            // Needles far longer than any stored text simply match nothing
            let long_needle = "%_\\".repeat(20_000);
            assert!(
                store.search(&long_needle, 10).unwrap().is_empty(),
                "{name}: long needle should be an empty result"
            );
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_search_returns_newest_first_and_caps_results() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            for i in 0..15 {
                add(store, &format!("match {i}"), "<@a>", i);
            }
            add(store, "unrelated", "<@a>", 99);

            let results = store.search("match", 10).unwrap();
            assert_eq!(results.len(), 10, "{name}");
            assert_eq!(results[0].quote, "match 14", "{name}");
            assert_eq!(results[9].quote, "match 5", "{name}");
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_leaderboard_orders_by_count_then_first_appearance() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            // <@c> appears first, <@b> and <@a> tie on two
            let order = ["<@c>", "<@b>", "<@a>", "<@a>", "<@b>", "<@d>", "<@d>", "<@d>"];
            for (i, quotee) in order.iter().enumerate() {
                add(store, &format!("q{i}"), quotee, i as u64);
            }

            let rows = store.leaderboard_top(10).unwrap();
            assert_eq!(
                rows,
                vec![
                    ("<@d>".to_string(), 3),
                    ("<@b>".to_string(), 2),
                    ("<@a>".to_string(), 2),
                    ("<@c>".to_string(), 1),
                ],
                "{name}"
            );

            assert_eq!(store.leaderboard_top(2).unwrap().len(), 2, "{name}");
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_leaderboard_caps_at_n() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            for i in 0..12 {
                add(store, "same text", &format!("<@{i}>"), i);
            }

            let rows = store.leaderboard_top(10).unwrap();
            assert_eq!(rows.len(), 10, "{name}");
            // All tied at one; earliest quotees win the slots
            assert_eq!(rows[0].0, "<@0>", "{name}");
            assert_eq!(rows[9].0, "<@9>", "{name}");
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            let created_at = UNIX_EPOCH + Duration::from_nanos(1_712_345_678_987_654_321);
            let original = Quote::new(
                "emoji 🦀 and \"quotes\" and\nnewlines",
                "<@111>",
                "<@222>",
                created_at,
            );
            store.insert(&original).unwrap();

            let stored = store.latest(&Scope::All).unwrap();
            assert_eq!(stored, original, "{name}");
            assert_eq!(store.at_offset(0, &Scope::All).unwrap(), original, "{name}");
        };
        test_all_stores!(test_fn);
    }

    #[test]
    fn test_insert_rejects_unrepresentable_timestamp() {
        let test_fn = |name: &str, store: &dyn QuoteStore| {
            let far_future = Quote::new(
                "future",
                "<@a>",
                "<@quoter>",
                UNIX_EPOCH + Duration::from_secs(10_500_000_000),
            );
            assert!(
                matches!(store.insert(&far_future), Err(QuoteError::InvalidQuote(_))),
                "{name}: timestamp past the nanosecond range should be InvalidQuote"
            );
            assert_eq!(store.count(&Scope::All).unwrap(), 0, "{name}");
        };
        test_all_stores!(test_fn);
    }
}
