//! The quote book facade
//!
//! [`QuoteBook`] owns a store together with the count cache and sampler that
//! sit in front of it, and keeps the two in step: every successful insert
//! invalidates the cached count before the insert is acknowledged.

use super::leaderboard::{self, LEADERBOARD_SIZE, LeaderboardRow};
use super::{
    CountCache, DEFAULT_COUNT_TTL, Quote, QuoteError, QuoteQuery, QuoteStore, RacePolicy,
    Sampler, Scope,
};
use std::time::{Duration, SystemTime};

/// Maximum number of search results
pub const SEARCH_LIMIT: usize = 10;

/// Quote collection with cached counting and uniform random retrieval
///
/// # Example
///
/// ```
/// use quotebook::{MemoryStore, Quote, QuoteBook, Scope};
/// use std::time::SystemTime;
///
/// let book = QuoteBook::new(MemoryStore::new());
/// book.add(Quote::new("the quick fox", "<@1>", "<@2>", SystemTime::now()))
///     .unwrap();
///
/// let quote = book.random_quote(&Scope::All, SystemTime::now()).unwrap();
/// assert_eq!(quote.quote, "the quick fox");
/// assert_eq!(book.count(SystemTime::now()).unwrap(), 1);
/// ```
pub struct QuoteBook<S: QuoteStore> {
    store: S,
    cache: CountCache,
    sampler: Sampler,
}

/// Builder for configuring a [`QuoteBook`]
///
/// # Example
///
/// ```
/// use quotebook::{MemoryStore, QuoteBook, RacePolicy};
/// use std::time::Duration;
///
/// let book = QuoteBook::builder(MemoryStore::new())
///     .count_ttl(Duration::from_secs(600))
///     .race_policy(RacePolicy::RetryOnce)
///     .seed(42)
///     .build();
/// ```
pub struct QuoteBookBuilder<S: QuoteStore> {
    store: S,
    count_ttl: Duration,
    race_policy: RacePolicy,
    seed: Option<u64>,
}

impl<S: QuoteStore> QuoteBookBuilder<S> {
    /// How long a fetched total count stays valid (default one hour)
    pub fn count_ttl(mut self, ttl: Duration) -> Self {
        self.count_ttl = ttl;
        self
    }

    /// Behavior when a sampled offset falls past the end (default surface)
    pub fn race_policy(mut self, policy: RacePolicy) -> Self {
        self.race_policy = policy;
        self
    }

    /// Seed the sampler for reproducible selection
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> QuoteBook<S> {
        let sampler = match self.seed {
            Some(seed) => Sampler::seed_from_u64(seed, self.race_policy),
            None => Sampler::new(self.race_policy),
        };
        QuoteBook {
            store: self.store,
            cache: CountCache::new(self.count_ttl),
            sampler,
        }
    }
}

impl<S: QuoteStore> QuoteBook<S> {
    /// Quote book with a one hour count TTL and an entropy-seeded sampler
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    pub fn builder(store: S) -> QuoteBookBuilder<S> {
        QuoteBookBuilder {
            store,
            count_ttl: DEFAULT_COUNT_TTL,
            race_policy: RacePolicy::default(),
            seed: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn count_cache(&self) -> &CountCache {
        &self.cache
    }

    /// Persist a quote
    ///
    /// The cached count is invalidated before this returns, so the new record
    /// is eligible for every later random selection.
    ///
    /// # Errors
    ///
    /// - [`QuoteError::InvalidQuote`]: blank text or pre-epoch timestamp
    /// - [`QuoteError::WriteFailed`]: the store rejected the insert
    pub fn add(&self, quote: Quote) -> Result<(), QuoteError> {
        quote.validate()?;
        self.store.insert(&quote)?;
        self.cache.invalidate();
        tracing::debug!(quotee = %quote.quotee, quoter = %quote.quoter, "added quote");
        Ok(())
    }

    /// Uniformly random quote within `scope`
    pub fn random_quote(&self, scope: &Scope, now: SystemTime) -> Result<Quote, QuoteError> {
        self.sampler.sample(&self.store, &self.cache, scope, now)
    }

    /// Most recently added quote within `scope`
    pub fn latest_quote(&self, scope: &Scope) -> Result<Quote, QuoteError> {
        self.store.latest(scope)
    }

    /// Resolve a single-record query
    pub fn query(&self, query: &QuoteQuery, now: SystemTime) -> Result<Quote, QuoteError> {
        match query {
            QuoteQuery::Random(scope) => self.random_quote(scope, now),
            QuoteQuery::Latest(scope) => self.latest_quote(scope),
        }
    }

    /// Total number of quotes, served from cache while fresh
    pub fn count(&self, now: SystemTime) -> Result<u64, QuoteError> {
        self.cache.read(now, || self.store.count(&Scope::All))
    }

    /// Up to ten quotes containing `text`, newest first
    pub fn search(&self, text: &str) -> Result<Vec<Quote>, QuoteError> {
        self.store.search(text, SEARCH_LIMIT)
    }

    /// Top ten quotees by number of quotes
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, QuoteError> {
        self.store
            .leaderboard_top(LEADERBOARD_SIZE)
            .map(leaderboard::rank)
    }
}
