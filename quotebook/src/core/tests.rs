use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Store wrapper that counts calls reaching the backing store
struct CountingStore<S> {
    inner: S,
    counts: AtomicUsize,
    offsets: AtomicUsize,
    // Number of upcoming at_offset calls that report a miss
    forced_misses: AtomicUsize,
}

impl<S> CountingStore<S> {
    fn new(inner: S) -> Self {
        CountingStore {
            inner,
            counts: AtomicUsize::new(0),
            offsets: AtomicUsize::new(0),
            forced_misses: AtomicUsize::new(0),
        }
    }

    fn counts(&self) -> usize {
        self.counts.load(Ordering::SeqCst)
    }

    fn offsets(&self) -> usize {
        self.offsets.load(Ordering::SeqCst)
    }

    fn force_misses(&self, n: usize) {
        self.forced_misses.store(n, Ordering::SeqCst);
    }
}

impl<S: QuoteStore> QuoteStore for CountingStore<S> {
    fn insert(&self, quote: &Quote) -> Result<(), QuoteError> {
        self.inner.insert(quote)
    }

    fn latest(&self, scope: &Scope) -> Result<Quote, QuoteError> {
        self.inner.latest(scope)
    }

    fn at_offset(&self, offset: u64, scope: &Scope) -> Result<Quote, QuoteError> {
        self.offsets.fetch_add(1, Ordering::SeqCst);
        let forced = self
            .forced_misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(QuoteError::NotFound {
                scope: scope.clone(),
            });
        }
        self.inner.at_offset(offset, scope)
    }

    fn count(&self, scope: &Scope) -> Result<u64, QuoteError> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count(scope)
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>, QuoteError> {
        self.inner.search(needle, limit)
    }

    fn leaderboard_top(&self, n: usize) -> Result<Vec<(String, u64)>, QuoteError> {
        self.inner.leaderboard_top(n)
    }
}

/// Store whose every call fails
struct BrokenStore;

impl QuoteStore for BrokenStore {
    fn insert(&self, _quote: &Quote) -> Result<(), QuoteError> {
        Err(QuoteError::WriteFailed("read-only medium".to_string()))
    }

    fn latest(&self, _scope: &Scope) -> Result<Quote, QuoteError> {
        Err(QuoteError::Backend("unreachable".to_string()))
    }

    fn at_offset(&self, _offset: u64, _scope: &Scope) -> Result<Quote, QuoteError> {
        Err(QuoteError::Backend("unreachable".to_string()))
    }

    fn count(&self, _scope: &Scope) -> Result<u64, QuoteError> {
        Err(QuoteError::Backend("unreachable".to_string()))
    }

    fn search(&self, _needle: &str, _limit: usize) -> Result<Vec<Quote>, QuoteError> {
        Err(QuoteError::Backend("unreachable".to_string()))
    }

    fn leaderboard_top(&self, _n: usize) -> Result<Vec<(String, u64)>, QuoteError> {
        Err(QuoteError::Backend("unreachable".to_string()))
    }
}

fn t0() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

fn quote(text: &str, quotee: &str) -> Quote {
    Quote::new(text, quotee, "<@quoter>", t0())
}

fn counting_book(seed: u64) -> (Arc<CountingStore<MemoryStore>>, QuoteBook<Arc<CountingStore<MemoryStore>>>) {
    let store = Arc::new(CountingStore::new(MemoryStore::new()));
    let book = QuoteBook::builder(Arc::clone(&store)).seed(seed).build();
    (store, book)
}

#[test]
fn test_count_cache_ttl() {
    let (store, book) = counting_book(1);
    for i in 0..3 {
        book.add(quote(&format!("q{i}"), "<@a>")).unwrap();
    }

    assert_eq!(book.count(t0()).unwrap(), 3);
    assert_eq!(store.counts(), 1);

    // Another quote lands behind the cache's back
    store.inner.insert(&quote("sneaky", "<@a>")).unwrap();

    assert_eq!(book.count(t0() + minutes(59)).unwrap(), 3);
    assert_eq!(store.counts(), 1, "no store access while fresh");

    assert_eq!(book.count(t0() + minutes(61)).unwrap(), 4);
    assert_eq!(store.counts(), 2, "exactly one store access once stale");
}

#[test]
fn test_add_invalidates_count() {
    let (store, book) = counting_book(1);
    book.add(quote("first", "<@a>")).unwrap();
    assert_eq!(book.count(t0()).unwrap(), 1);
    assert_eq!(book.count(t0()).unwrap(), 1);
    assert_eq!(store.counts(), 1);

    book.add(quote("second", "<@a>")).unwrap();
    assert_eq!(book.count(t0() + Duration::from_secs(1)).unwrap(), 2);
    assert_eq!(store.counts(), 2);
}

#[test]
fn test_new_quote_is_reachable_by_random_right_after_add() {
    let (_store, book) = counting_book(3);
    book.add(quote("old", "<@a>")).unwrap();
    // Warm the cache at N = 1
    book.random_quote(&Scope::All, t0()).unwrap();

    book.add(quote("new", "<@a>")).unwrap();

    let mut saw_new = false;
    for _ in 0..200 {
        if book.random_quote(&Scope::All, t0()).unwrap().quote == "new" {
            saw_new = true;
            break;
        }
    }
    assert!(saw_new, "a stale count of 1 would never reach offset 1");
}

#[test]
fn test_failed_add_keeps_cache() {
    let book = QuoteBook::new(BrokenStore);
    let err = book.add(quote("text", "<@a>")).unwrap_err();
    assert_eq!(err, QuoteError::WriteFailed("read-only medium".to_string()));
    assert_eq!(book.count_cache().cached(), None);
}

#[test]
fn test_add_rejects_blank_text() {
    let (_store, book) = counting_book(1);
    let err = book.add(quote("  ", "<@a>")).unwrap_err();
    assert!(matches!(err, QuoteError::InvalidQuote(_)));
    assert_eq!(book.store().inner.count(&Scope::All).unwrap(), 0);
}

#[test]
fn test_random_on_empty_collection() {
    let (store, book) = counting_book(1);
    let err = book.random_quote(&Scope::All, t0()).unwrap_err();
    assert_eq!(err, QuoteError::NotFound { scope: Scope::All });
    assert_eq!(store.offsets(), 0, "no offset lookup for an empty population");
}

#[test]
fn test_random_on_empty_scope() {
    let (store, book) = counting_book(1);
    book.add(quote("someone else", "<@a>")).unwrap();

    let scope = Scope::Quotee("<@nobody>".to_string());
    let err = book.random_quote(&scope, t0()).unwrap_err();
    assert_eq!(
        err,
        QuoteError::EmptyPopulation {
            quotee: "<@nobody>".to_string()
        }
    );
    assert!(err.is_not_found());
    assert_eq!(store.offsets(), 0);
}

#[test]
fn test_scoped_random_only_returns_that_quotee() {
    let (_store, book) = counting_book(9);
    for i in 0..20 {
        let quotee = if i % 4 == 0 { "<@target>" } else { "<@other>" };
        book.add(quote(&format!("q{i}"), quotee)).unwrap();
    }

    let scope = Scope::Quotee("<@target>".to_string());
    for _ in 0..100 {
        assert_eq!(book.random_quote(&scope, t0()).unwrap().quotee, "<@target>");
    }
}

#[test]
fn test_scoped_random_counts_exactly_every_time() {
    let (store, book) = counting_book(2);
    book.add(quote("a", "<@a>")).unwrap();

    let scope = Scope::Quotee("<@a>".to_string());
    book.random_quote(&scope, t0()).unwrap();
    book.random_quote(&scope, t0()).unwrap();
    assert_eq!(store.counts(), 2);
    // Scoped counts never populate the global cache
    assert_eq!(book.count_cache().cached(), None);
}

#[test]
fn test_race_surfaces_not_found_by_default() {
    let (store, book) = counting_book(4);
    book.add(quote("only", "<@a>")).unwrap();

    store.force_misses(1);
    let err = book.random_quote(&Scope::All, t0()).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.offsets(), 1);
}

#[test]
fn test_race_retry_once_recovers() {
    let store = Arc::new(CountingStore::new(MemoryStore::new()));
    let book = QuoteBook::builder(Arc::clone(&store))
        .seed(4)
        .race_policy(RacePolicy::RetryOnce)
        .build();
    book.add(quote("only", "<@a>")).unwrap();
    book.count(t0()).unwrap();
    assert_eq!(store.counts(), 1);

    store.force_misses(1);
    assert_eq!(book.random_quote(&Scope::All, t0()).unwrap().quote, "only");
    assert_eq!(store.offsets(), 2);
    assert_eq!(store.counts(), 2, "retry refreshes the population size");
}

#[test]
fn test_race_retry_once_gives_up_after_second_miss() {
    let store = Arc::new(CountingStore::new(MemoryStore::new()));
    let book = QuoteBook::builder(Arc::clone(&store))
        .race_policy(RacePolicy::RetryOnce)
        .build();
    book.add(quote("only", "<@a>")).unwrap();

    store.force_misses(2);
    assert!(book.random_quote(&Scope::All, t0()).unwrap_err().is_not_found());
    assert_eq!(store.offsets(), 2);
}

#[test]
fn test_random_is_uniform() {
    // Pearson chi-square over 10 equally likely records, 9 degrees of freedom.
    // 27.88 is the p = 0.001 critical value.
    const RECORDS: usize = 10;
    const TRIALS: usize = 20_000;

    let book = QuoteBook::builder(MemoryStore::new()).seed(0x5eed).build();
    for i in 0..RECORDS {
        book.add(quote(&i.to_string(), "<@a>")).unwrap();
    }

    let mut observed = [0usize; RECORDS];
    for _ in 0..TRIALS {
        let picked: usize = book
            .random_quote(&Scope::All, t0())
            .unwrap()
            .quote
            .parse()
            .unwrap();
        observed[picked] += 1;
    }

    let expected = TRIALS as f64 / RECORDS as f64;
    let chi_square: f64 = observed
        .iter()
        .map(|&o| {
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum();
    assert!(
        chi_square < 27.88,
        "chi-square {chi_square:.2} suggests a biased sampler: {observed:?}"
    );
}

#[test]
fn test_leaderboard_ranking() {
    let (_store, book) = counting_book(1);
    let inserts = [
        "<@a>", "<@b>", "<@b>", "<@a>", "<@c>", "<@b>", "<@b>", "<@a>", "<@b>",
    ];
    for (i, quotee) in inserts.iter().enumerate() {
        book.add(quote(&format!("q{i}"), quotee)).unwrap();
    }

    let rows = book.leaderboard().unwrap();
    assert_eq!(
        rows,
        vec![
            LeaderboardRow {
                rank: 1,
                quotee: "<@b>".to_string(),
                count: 5
            },
            LeaderboardRow {
                rank: 2,
                quotee: "<@a>".to_string(),
                count: 3
            },
            LeaderboardRow {
                rank: 3,
                quotee: "<@c>".to_string(),
                count: 1
            },
        ]
    );
    assert_eq!(rows[0].to_string(), "`1:` <@b>: 5");
}

#[test]
fn test_leaderboard_empty() {
    let (_store, book) = counting_book(1);
    assert!(book.leaderboard().unwrap().is_empty());
}

#[test]
fn test_latest_ordering() {
    let (_store, book) = counting_book(1);
    book.add(quote("Q1", "<@a>")).unwrap();
    book.add(quote("Q2", "<@b>")).unwrap();
    book.add(quote("Q3", "<@a>")).unwrap();

    assert_eq!(book.latest_quote(&Scope::All).unwrap().quote, "Q3");
    assert_eq!(
        book.latest_quote(&Scope::Quotee("<@b>".to_string()))
            .unwrap()
            .quote,
        "Q2"
    );
    assert_eq!(
        book.query(&QuoteQuery::Latest(Scope::All), t0())
            .unwrap()
            .quote,
        "Q3"
    );
}

#[test]
fn test_search_through_book() {
    let (_store, book) = counting_book(1);
    book.add(quote("foo bar", "<@a>")).unwrap();
    book.add(quote("bar baz", "<@a>")).unwrap();
    book.add(quote("qux", "<@a>")).unwrap();

    let found: Vec<String> = book
        .search("bar")
        .unwrap()
        .into_iter()
        .map(|q| q.quote)
        .collect();
    assert_eq!(found, ["bar baz", "foo bar"]);

    for i in 0..15 {
        book.add(quote(&format!("bar {i}"), "<@a>")).unwrap();
    }
    assert_eq!(book.search("bar").unwrap().len(), SEARCH_LIMIT);
}

#[test]
fn test_round_trip_through_book() {
    let (_store, book) = counting_book(1);
    let created_at = UNIX_EPOCH + Duration::new(1_700_000_123, 456_789_012);
    let original = Quote::new("exact", "<@a>", "<@b>", created_at);
    book.add(original.clone()).unwrap();

    assert_eq!(book.latest_quote(&Scope::All).unwrap(), original);
    assert_eq!(book.random_quote(&Scope::All, t0()).unwrap(), original);
}

#[test]
fn test_backend_errors_propagate() {
    let book = QuoteBook::new(BrokenStore);
    assert!(matches!(book.count(t0()), Err(QuoteError::Backend(_))));
    assert!(matches!(
        book.random_quote(&Scope::All, t0()),
        Err(QuoteError::Backend(_))
    ));
    assert!(matches!(book.leaderboard(), Err(QuoteError::Backend(_))));
    assert!(matches!(book.search("x"), Err(QuoteError::Backend(_))));
}

#[cfg(feature = "sqlite")]
#[test]
fn test_memory_and_sqlite_books_agree() {
    let memory = QuoteBook::builder(MemoryStore::new()).seed(11).build();
    let sqlite = QuoteBook::builder(SqliteStore::open_in_memory("quotes").unwrap())
        .seed(11)
        .build();

    for i in 0..30u64 {
        let q = Quote::new(
            format!("line {i}"),
            format!("<@{}>", i % 4),
            "<@quoter>",
            t0() + Duration::from_millis(i),
        );
        memory.add(q.clone()).unwrap();
        sqlite.add(q).unwrap();
    }

    // Same seed and same offsets resolve to the same records
    for _ in 0..50 {
        assert_eq!(
            memory.random_quote(&Scope::All, t0()).unwrap(),
            sqlite.random_quote(&Scope::All, t0()).unwrap()
        );
    }
    assert_eq!(memory.leaderboard().unwrap(), sqlite.leaderboard().unwrap());
    assert_eq!(memory.search("line 2").unwrap(), sqlite.search("line 2").unwrap());
    assert_eq!(memory.count(t0()).unwrap(), sqlite.count(t0()).unwrap());
}
