//! Store factory for creating the quote book actor
//!
//! # Store Types
//!
//! ## Memory Store
//! - Quotes live in process memory and vanish on restart
//! - Best for: local runs and tests
//!
//! ## SQLite Store
//! - Quotes persist in one table of a database file
//! - WAL journaling with a configurable busy timeout
//! - Best for: production

use crate::actor::{QuoteBookActor, QuoteBookHandle};
use crate::config::{BookConfig, StoreConfig, StoreType};
use anyhow::{Context, Result};
use quotebook::{MemoryStore, QuoteBook, QuoteStore, SqliteStore};

/// Create a quote book actor with the configured store
///
/// # Errors
///
/// Returns an error if the SQLite database cannot be opened or migrated.
///
/// # Example
///
/// ```ignore
/// let handle = create_quote_book(&config.store, &config.book, config.buffer_size)?;
/// let total = handle.count().await?;
/// ```
pub fn create_quote_book(
    store: &StoreConfig,
    book: &BookConfig,
    buffer_size: usize,
) -> Result<QuoteBookHandle> {
    let handle = match store.store_type {
        StoreType::Memory => spawn(MemoryStore::new(), book, buffer_size),
        StoreType::Sqlite => {
            let sqlite = SqliteStore::open(store.sqlite_config()).with_context(|| {
                format!(
                    "Failed to open SQLite store at {}",
                    store.sqlite_path.display()
                )
            })?;
            spawn(sqlite, book, buffer_size)
        }
    };

    Ok(handle)
}

fn spawn<S: QuoteStore + 'static>(
    store: S,
    config: &BookConfig,
    buffer_size: usize,
) -> QuoteBookHandle {
    let book = QuoteBook::builder(store)
        .count_ttl(config.count_ttl)
        .race_policy(config.race_policy)
        .build();
    QuoteBookActor::spawn(buffer_size, book, config.request_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotebook::{Quote, RacePolicy};
    use std::time::{Duration, SystemTime};

    fn book_config() -> BookConfig {
        BookConfig {
            count_ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(10),
            race_policy: RacePolicy::Surface,
        }
    }

    #[tokio::test]
    async fn test_sqlite_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreConfig {
            store_type: StoreType::Sqlite,
            sqlite_path: dir.path().join("quotes.db"),
            table: "quotes".to_string(),
            busy_timeout_ms: 1_000,
        };

        let handle = create_quote_book(&store, &book_config(), 8).unwrap();
        handle
            .add(Quote::new("kept", "<@1>", "<@2>", SystemTime::now()))
            .await
            .unwrap();
        drop(handle);

        let handle = create_quote_book(&store, &book_config(), 8).unwrap();
        assert_eq!(handle.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unopenable_sqlite_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreConfig {
            store_type: StoreType::Sqlite,
            sqlite_path: dir.path().join("missing").join("quotes.db"),
            table: "quotes".to_string(),
            busy_timeout_ms: 1_000,
        };

        assert!(create_quote_book(&store, &book_config(), 8).is_err());
    }
}
