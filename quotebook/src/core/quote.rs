//! The quote record and the ways of addressing it

use super::QuoteError;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// One stored quip
///
/// Records are immutable once stored. `quotee` and `quoter` are opaque user
/// identifiers (mention tokens such as `<@1234>` in practice); the store never
/// interprets them beyond equality.
///
/// # Example
///
/// ```
/// use quotebook::Quote;
/// use std::time::SystemTime;
///
/// let quote = Quote::new("the quick fox", "<@1>", "<@2>", SystemTime::now());
/// assert!(quote.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// The quoted text
    pub quote: String,
    /// Who said it
    pub quotee: String,
    /// Who submitted it
    pub quoter: String,
    /// Submission time of the originating command
    pub created_at: SystemTime,
}

impl Quote {
    pub fn new(
        quote: impl Into<String>,
        quotee: impl Into<String>,
        quoter: impl Into<String>,
        created_at: SystemTime,
    ) -> Self {
        Quote {
            quote: quote.into(),
            quotee: quotee.into(),
            quoter: quoter.into(),
            created_at,
        }
    }

    /// Check the record before it is handed to a store
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::InvalidQuote`] if the text is blank or the
    /// timestamp precedes the Unix epoch or lies past what a signed 64-bit
    /// nanosecond count can hold.
    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.quote.trim().is_empty() {
            return Err(QuoteError::InvalidQuote("quote text is empty".to_string()));
        }
        let since_epoch = self.created_at.duration_since(UNIX_EPOCH).map_err(|_| {
            QuoteError::InvalidQuote("created_at precedes the unix epoch".to_string())
        })?;
        // Persisted as i64 nanoseconds, which ends in April 2262
        if i64::try_from(since_epoch.as_nanos()).is_err() {
            return Err(QuoteError::InvalidQuote(
                "created_at is too far in the future".to_string(),
            ));
        }
        Ok(())
    }
}

/// Optional restriction of an operation to one quotee's records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Every record in the collection
    #[default]
    All,
    /// Only records attributed to this quotee
    Quotee(String),
}

impl Scope {
    /// Scope from an optional quotee identifier.
    pub fn from_quotee(quotee: Option<impl Into<String>>) -> Self {
        match quotee {
            Some(id) => Scope::Quotee(id.into()),
            None => Scope::All,
        }
    }

    pub fn quotee(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Quotee(id) => Some(id),
        }
    }

    pub(crate) fn matches(&self, quote: &Quote) -> bool {
        match self {
            Scope::All => true,
            Scope::Quotee(id) => quote.quotee == *id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "the collection"),
            Scope::Quotee(id) => write!(f, "{id}"),
        }
    }
}

/// Single-record retrieval modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteQuery {
    /// A uniformly random record within the scope
    Random(Scope),
    /// The most recently inserted record within the scope
    Latest(Scope),
}

impl QuoteQuery {
    pub fn scope(&self) -> &Scope {
        match self {
            QuoteQuery::Random(scope) | QuoteQuery::Latest(scope) => scope,
        }
    }
}
