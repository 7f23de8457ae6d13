//! Core components of the quotebook library
//!
//! This module contains the fundamental building blocks:
//! - [`quote`]: The quote record, scopes and query modes
//! - [`store`]: Storage backends for the quote collection
//! - [`count_cache`]: Time-bounded cache of the total quote count
//! - [`sampler`]: Uniform random selection over a store without a native random-row primitive
//! - [`leaderboard`]: Ranked per-quotee aggregation
//! - [`quote_book`]: The facade tying the pieces together

pub mod count_cache;
pub mod leaderboard;
pub mod quote;
pub mod quote_book;
pub mod sampler;
pub mod store;
#[cfg(test)]
mod tests;

pub use count_cache::{CountCache, DEFAULT_COUNT_TTL};
pub use leaderboard::{LEADERBOARD_SIZE, LeaderboardRow};
pub use quote::{Quote, QuoteQuery, Scope};
pub use quote_book::{QuoteBook, QuoteBookBuilder, SEARCH_LIMIT};
pub use sampler::{RacePolicy, Sampler};
pub use store::{MemoryStore, QuoteStore};
#[cfg(feature = "sqlite")]
pub use store::{SqliteStore, SqliteStoreConfig};

use std::time::Duration;

/// Errors that can occur while storing or retrieving quotes
///
/// # Variants
///
/// - [`NotFound`](QuoteError::NotFound): No record matches the requested scope or offset
/// - [`EmptyPopulation`](QuoteError::EmptyPopulation): Scoped sampling found zero eligible records
/// - [`InvalidQuote`](QuoteError::InvalidQuote): The quote was rejected before reaching the store
/// - [`InvalidConfig`](QuoteError::InvalidConfig): A store was configured with unusable settings
/// - [`WriteFailed`](QuoteError::WriteFailed): The backing medium rejected an insert
/// - [`Backend`](QuoteError::Backend): The backing medium failed a read
/// - [`Timeout`](QuoteError::Timeout): An operation exceeded its time bound
///
/// `NotFound` and `EmptyPopulation` are expected outcomes that callers turn into
/// a "no quotes found" response; the others are system failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    #[error("no quotes found for {scope}")]
    NotFound { scope: Scope },

    #[error("no quotes recorded for {quotee}")]
    EmptyPopulation { quotee: String },

    #[error("invalid quote: {0}")]
    InvalidQuote(String),

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl QuoteError {
    /// True when the error means "nothing matched" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QuoteError::NotFound { .. } | QuoteError::EmptyPopulation { .. }
        )
    }

    pub(crate) fn not_found(scope: &Scope) -> Self {
        QuoteError::NotFound {
            scope: scope.clone(),
        }
    }
}
