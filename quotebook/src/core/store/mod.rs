use super::{Quote, QuoteError, Scope};
use std::sync::Arc;


mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteStore, SqliteStoreConfig};

#[cfg(test)]
mod store_test_suite;

/// Storage backend for the quote collection
///
/// Every backend orders records by insertion. That order is the single
/// ordering key behind `latest`, `at_offset` enumeration, search result
/// order and leaderboard tie-breaking, so two backends holding the same
/// inserts answer every query identically.
///
/// Stores take `&self` and synchronize internally so one instance can be
/// shared between the count cache, the sampler and concurrent callers.
pub trait QuoteStore: Send + Sync {
    /// Append one record
    ///
    /// Records failing [`Quote::validate`] are rejected with
    /// [`QuoteError::InvalidQuote`] by every backend.
    fn insert(&self, quote: &Quote) -> Result<(), QuoteError>;

    /// Most recently inserted record within the scope
    fn latest(&self, scope: &Scope) -> Result<Quote, QuoteError>;

    /// Record at zero-based `offset` in insertion order within the scope
    ///
    /// Returns [`QuoteError::NotFound`] when `offset` is past the end.
    fn at_offset(&self, offset: u64, scope: &Scope) -> Result<Quote, QuoteError>;

    /// Exact number of records within the scope
    fn count(&self, scope: &Scope) -> Result<u64, QuoteError>;

    /// Up to `limit` records whose text contains `needle`, newest first
    ///
    /// `needle` is a literal substring; `%`, `_` and `\` carry no special
    /// meaning. Matching ignores ASCII case.
    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>, QuoteError>;

    /// Up to `n` `(quotee, count)` pairs ordered by count descending
    ///
    /// Ties resolve toward the quotee whose first record was inserted earliest.
    fn leaderboard_top(&self, n: usize) -> Result<Vec<(String, u64)>, QuoteError>;
}

impl<S: QuoteStore + ?Sized> QuoteStore for Box<S> {
    fn insert(&self, quote: &Quote) -> Result<(), QuoteError> {
        (**self).insert(quote)
    }

    fn latest(&self, scope: &Scope) -> Result<Quote, QuoteError> {
        (**self).latest(scope)
    }

    fn at_offset(&self, offset: u64, scope: &Scope) -> Result<Quote, QuoteError> {
        (**self).at_offset(offset, scope)
    }

    fn count(&self, scope: &Scope) -> Result<u64, QuoteError> {
        (**self).count(scope)
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>, QuoteError> {
        (**self).search(needle, limit)
    }

    fn leaderboard_top(&self, n: usize) -> Result<Vec<(String, u64)>, QuoteError> {
        (**self).leaderboard_top(n)
    }
}

impl<S: QuoteStore + ?Sized> QuoteStore for Arc<S> {
    fn insert(&self, quote: &Quote) -> Result<(), QuoteError> {
        (**self).insert(quote)
    }

    fn latest(&self, scope: &Scope) -> Result<Quote, QuoteError> {
        (**self).latest(scope)
    }

    fn at_offset(&self, offset: u64, scope: &Scope) -> Result<Quote, QuoteError> {
        (**self).at_offset(offset, scope)
    }

    fn count(&self, scope: &Scope) -> Result<u64, QuoteError> {
        (**self).count(scope)
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>, QuoteError> {
        (**self).search(needle, limit)
    }

    fn leaderboard_top(&self, n: usize) -> Result<Vec<(String, u64)>, QuoteError> {
        (**self).leaderboard_top(n)
    }
}
