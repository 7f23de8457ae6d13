use super::QuoteStore;
use crate::core::{Quote, QuoteError, Scope};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

const DEFAULT_CAPACITY: usize = 1000;

/// In-memory quote store
///
/// Keeps records in a vector in insertion order, so the vector index is the
/// ordering key. Contents are lost when the process exits; use it for tests,
/// local runs and benchmarks.
///
/// # Example
///
/// ```
/// use quotebook::{MemoryStore, Quote, QuoteStore, Scope};
/// use std::time::SystemTime;
///
/// let store = MemoryStore::new();
/// store
///     .insert(&Quote::new("hello", "<@1>", "<@2>", SystemTime::now()))
///     .unwrap();
/// assert_eq!(store.count(&Scope::All).unwrap(), 1);
/// ```
pub struct MemoryStore {
    quotes: RwLock<Vec<Quote>>,
}

impl MemoryStore {
    /// Create an empty store with room for 1000 records
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            quotes: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    // Records are append-only, so a poisoned lock still guards a consistent vector.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Quote>> {
        self.quotes.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteStore for MemoryStore {
    fn insert(&self, quote: &Quote) -> Result<(), QuoteError> {
        quote.validate()?;
        self.quotes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(quote.clone());
        Ok(())
    }

    fn latest(&self, scope: &Scope) -> Result<Quote, QuoteError> {
        self.read()
            .iter()
            .rev()
            .find(|quote| scope.matches(quote))
            .cloned()
            .ok_or_else(|| QuoteError::not_found(scope))
    }

    fn at_offset(&self, offset: u64, scope: &Scope) -> Result<Quote, QuoteError> {
        let offset =
            usize::try_from(offset).map_err(|_| QuoteError::not_found(scope))?;
        self.read()
            .iter()
            .filter(|quote| scope.matches(quote))
            .nth(offset)
            .cloned()
            .ok_or_else(|| QuoteError::not_found(scope))
    }

    fn count(&self, scope: &Scope) -> Result<u64, QuoteError> {
        let quotes = self.read();
        let total = match scope {
            Scope::All => quotes.len(),
            Scope::Quotee(_) => quotes.iter().filter(|quote| scope.matches(quote)).count(),
        };
        Ok(total as u64)
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>, QuoteError> {
        let needle = needle.to_ascii_lowercase();
        Ok(self
            .read()
            .iter()
            .rev()
            .filter(|quote| quote.quote.to_ascii_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    fn leaderboard_top(&self, n: usize) -> Result<Vec<(String, u64)>, QuoteError> {
        let quotes = self.read();

        // quotee -> (count, index of first record)
        let mut tally: HashMap<&str, (u64, usize)> = HashMap::new();
        for (index, quote) in quotes.iter().enumerate() {
            tally
                .entry(quote.quotee.as_str())
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, index));
        }

        let mut rows: Vec<_> = tally.into_iter().collect();
        rows.sort_by(|(_, (a_count, a_first)), (_, (b_count, b_first))| {
            b_count.cmp(a_count).then(a_first.cmp(b_first))
        });
        rows.truncate(n);

        Ok(rows
            .into_iter()
            .map(|(quotee, (count, _))| (quotee.to_string(), count))
            .collect())
    }
}
