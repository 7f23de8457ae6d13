//! # Quotebook
//!
//! Storage and retrieval for a chat quote collection: uniform random
//! selection, a cached population count and a per-quotee leaderboard.
//!
//! ## Overview
//!
//! A [`QuoteBook`] wraps a [`QuoteStore`] and provides:
//! - **Uniform random selection**: globally or scoped to one quotee, using a
//!   counted offset instead of a native "random row" primitive
//! - **Cached counting**: the total is fetched at most once per hour unless a
//!   new quote invalidates it
//! - **Latest and search**: newest-first retrieval by insertion order
//! - **Leaderboard**: the ten most quoted users with deterministic ties
//!
//! ## Quick Start
//!
//! ```
//! use quotebook::{MemoryStore, Quote, QuoteBook, Scope};
//! use std::time::SystemTime;
//!
//! let book = QuoteBook::new(MemoryStore::new());
//!
//! book.add(Quote::new("ship it", "<@1>", "<@2>", SystemTime::now()))?;
//! book.add(Quote::new("it works on my machine", "<@3>", "<@2>", SystemTime::now()))?;
//!
//! let quote = book.random_quote(&Scope::Quotee("<@1>".into()), SystemTime::now())?;
//! assert_eq!(quote.quote, "ship it");
//!
//! for row in book.leaderboard()? {
//!     println!("{row}");
//! }
//! # Ok::<(), quotebook::QuoteError>(())
//! ```
//!
//! ## Store Types
//!
//! ### [`MemoryStore`]
//! Keeps everything in a vector. Best for tests and local runs.
//!
//! ### [`SqliteStore`]
//! Persists quotes in one SQLite table. `createdAt` is stored as nanoseconds
//! since the Unix epoch.
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), quotebook::QuoteError> {
//! use quotebook::{QuoteBook, SqliteStore, SqliteStoreConfig};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = SqliteStoreConfig::new(dir.path().join("quotes.db")).table("quotes");
//! let book = QuoteBook::new(SqliteStore::open(config)?);
//! # drop(book);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```
//!
//! ## Time
//!
//! Operations that depend on the clock take `now` explicitly, so cache expiry
//! can be exercised without waiting.
//!
//! ## Thread Safety
//!
//! [`QuoteBook`] is `Send + Sync`. Stores synchronize internally, and the
//! count cache and sampler guard their state with mutexes, so a book can be
//! shared behind an `Arc`.
//!
//! ## Features
//!
//! - `ahash` (default): Use AHash for leaderboard grouping in [`MemoryStore`]
//! - `sqlite` (default): Enable [`SqliteStore`]

pub mod core;

pub use core::{
    CountCache, DEFAULT_COUNT_TTL, LEADERBOARD_SIZE, LeaderboardRow, MemoryStore, Quote,
    QuoteBook, QuoteBookBuilder, QuoteError, QuoteQuery, QuoteStore, RacePolicy, SEARCH_LIMIT,
    Sampler, Scope,
};
#[cfg(feature = "sqlite")]
pub use core::{SqliteStore, SqliteStoreConfig};

// Re-export the store and leaderboard modules so benchmarks and servers can reach them
pub use crate::core::{leaderboard, store};
