use super::{CountCache, Quote, QuoteError, QuoteStore, Scope};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

/// What to do when a drawn offset no longer resolves to a record
///
/// The count and the offset lookup are two separate store calls, so the
/// population can change between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RacePolicy {
    /// Report the miss as `NotFound`
    #[default]
    Surface,
    /// Refresh the population size and draw once more before reporting the miss
    RetryOnce,
}

impl RacePolicy {
    fn attempts(self) -> u32 {
        match self {
            RacePolicy::Surface => 1,
            RacePolicy::RetryOnce => 2,
        }
    }
}

impl FromStr for RacePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "surface" => Ok(RacePolicy::Surface),
            "retry-once" | "retry_once" | "retry" => Ok(RacePolicy::RetryOnce),
            _ => Err(format!(
                "Invalid race policy: {s}. Valid options are: surface, retry-once"
            )),
        }
    }
}

impl fmt::Display for RacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RacePolicy::Surface => write!(f, "surface"),
            RacePolicy::RetryOnce => write!(f, "retry-once"),
        }
    }
}

/// Uniform random selection over a store addressed by offset
///
/// Draws an offset uniformly from `[0, N)` where `N` is the population size
/// and fetches the record at that offset. The unscoped population comes from
/// the [`CountCache`]; a scoped population is always counted exactly, since
/// caching per-quotee totals would need per-quotee invalidation.
///
/// The generator is seeded once at construction and shared by every draw.
pub struct Sampler {
    rng: Mutex<StdRng>,
    policy: RacePolicy,
}

impl Sampler {
    /// Sampler seeded from OS entropy
    pub fn new(policy: RacePolicy) -> Self {
        Self::from_rng(StdRng::from_entropy(), policy)
    }

    /// Deterministic sampler for tests and benchmarks
    pub fn seed_from_u64(seed: u64, policy: RacePolicy) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), policy)
    }

    fn from_rng(rng: StdRng, policy: RacePolicy) -> Self {
        Sampler {
            rng: Mutex::new(rng),
            policy,
        }
    }

    pub fn policy(&self) -> RacePolicy {
        self.policy
    }

    /// Uniform draw from `[0, population)`; `population` must be positive.
    pub fn draw(&self, population: u64) -> u64 {
        debug_assert!(population > 0, "cannot draw from an empty population");
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..population)
    }

    /// Select a uniformly random record within `scope`
    ///
    /// # Errors
    ///
    /// - [`QuoteError::EmptyPopulation`] when a quotee has no records
    /// - [`QuoteError::NotFound`] when the collection is empty, or when the
    ///   drawn offset fell past the end and the race policy gave up
    /// - any store error from counting or fetching
    pub fn sample<S>(
        &self,
        store: &S,
        cache: &CountCache,
        scope: &Scope,
        now: SystemTime,
    ) -> Result<Quote, QuoteError>
    where
        S: QuoteStore + ?Sized,
    {
        let attempts = self.policy.attempts();
        let mut attempt = 1;
        loop {
            let population = match scope {
                Scope::All => cache.read(now, || store.count(scope))?,
                Scope::Quotee(_) => store.count(scope)?,
            };
            if population == 0 {
                return Err(match scope {
                    Scope::All => QuoteError::not_found(scope),
                    Scope::Quotee(quotee) => QuoteError::EmptyPopulation {
                        quotee: quotee.clone(),
                    },
                });
            }

            let offset = self.draw(population);
            match store.at_offset(offset, scope) {
                Err(err) if err.is_not_found() => {
                    tracing::warn!(
                        %scope,
                        offset,
                        population,
                        attempt,
                        policy = %self.policy,
                        "sampled offset past the end of the collection"
                    );
                    if attempt >= attempts {
                        return Err(err);
                    }
                    if matches!(scope, Scope::All) {
                        cache.invalidate();
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(RacePolicy::default())
    }
}
