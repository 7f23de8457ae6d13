use super::QuoteError;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

/// How long a fetched total stays authoritative
pub const DEFAULT_COUNT_TTL: Duration = Duration::from_secs(60 * 60);

/// Time-bounded cache of the total quote count
///
/// The cached total is served while it is younger than the TTL and no insert
/// has happened since it was fetched. Inserts call [`invalidate`](Self::invalidate),
/// so a read never returns a total smaller than the number of completed
/// inserts.
///
/// Time is passed in explicitly, which keeps expiry deterministic in tests.
///
/// # Example
///
/// ```
/// use quotebook::CountCache;
/// use std::time::{Duration, SystemTime};
///
/// let cache = CountCache::new(Duration::from_secs(3600));
/// let now = SystemTime::now();
///
/// assert_eq!(cache.read(now, || Ok(42)).unwrap(), 42);
/// // Served from cache: the fetch is not called again
/// assert_eq!(cache.read(now, || unreachable!()).unwrap(), 42);
/// ```
pub struct CountCache {
    ttl: Duration,
    entry: Mutex<Entry>,
}

#[derive(Debug, Default)]
struct Entry {
    total: u64,
    // None means never fetched or invalidated
    last_updated: Option<SystemTime>,
    // Bumped by every invalidation
    generation: u64,
}

impl CountCache {
    pub fn new(ttl: Duration) -> Self {
        CountCache {
            ttl,
            entry: Mutex::new(Entry::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // The entry is two integers and a timestamp; any state left by a panicking
    // holder is still a valid entry.
    fn lock(&self) -> MutexGuard<'_, Entry> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the total, calling `fetch` only when the cached value is stale
    ///
    /// The lock is not held while `fetch` runs. A fetched total is stored only
    /// if no invalidation happened meanwhile, so a count taken before a
    /// concurrent insert cannot outlive that insert. A failed fetch leaves the
    /// cache untouched.
    pub fn read<F>(&self, now: SystemTime, fetch: F) -> Result<u64, QuoteError>
    where
        F: FnOnce() -> Result<u64, QuoteError>,
    {
        let generation = {
            let entry = self.lock();
            if let Some(last_updated) = entry.last_updated {
                // A clock that moved backwards counts as zero age
                let age = now.duration_since(last_updated).unwrap_or_default();
                if age < self.ttl {
                    tracing::debug!(total = entry.total, age_secs = age.as_secs(), "quote count cache hit");
                    return Ok(entry.total);
                }
            }
            entry.generation
        };

        let total = fetch()?;

        let mut entry = self.lock();
        if entry.generation == generation {
            entry.total = total;
            entry.last_updated = Some(now);
            tracing::debug!(total, "refreshed cached quote count");
        }
        Ok(total)
    }

    /// Force the next read to fetch
    pub fn invalidate(&self) {
        let mut entry = self.lock();
        entry.last_updated = None;
        entry.generation = entry.generation.wrapping_add(1);
    }

    /// Cached total if one is held, regardless of age
    pub fn cached(&self) -> Option<u64> {
        let entry = self.lock();
        entry.last_updated.map(|_| entry.total)
    }
}

impl Default for CountCache {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT_TTL)
    }
}
