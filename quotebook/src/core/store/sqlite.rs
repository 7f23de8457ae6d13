use super::QuoteStore;
use crate::core::{Quote, QuoteError, Scope};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_TABLE: &str = "quotes";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const MAX_TABLE_NAME_LEN: usize = 64;

/// Configuration for [`SqliteStore`]
///
/// `table` is interpolated into SQL, so it must be a plain identifier:
/// an ASCII letter or underscore followed by letters, digits or underscores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteStoreConfig {
    /// Database file, created when missing
    pub path: PathBuf,
    /// Table holding the quotes
    pub table: String,
    /// How long a statement waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteStoreConfig {
            path: path.into(),
            table: DEFAULT_TABLE.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    /// Check the settings without opening the database
    pub fn validate(&self) -> Result<(), QuoteError> {
        validate_table_name(&self.table)
    }
}

/// SQLite-backed quote store
///
/// Records live in one table keyed by an autoincrementing `id`, which is the
/// ordering key. `createdAt` holds nanoseconds since the Unix epoch so
/// timestamps survive a round trip exactly.
///
/// SQLite offers no cheap uniform random row, which is why random selection
/// goes through a counted offset instead of `ORDER BY RANDOM()`.
///
/// # Example
///
/// ```
/// use quotebook::{Quote, QuoteStore, Scope, SqliteStore};
/// use std::time::SystemTime;
///
/// let store = SqliteStore::open_in_memory("quotes").unwrap();
/// store
///     .insert(&Quote::new("hello", "<@1>", "<@2>", SystemTime::now()))
///     .unwrap();
/// assert_eq!(store.latest(&Scope::All).unwrap().quote, "hello");
/// ```
pub struct SqliteStore {
    connection: Mutex<Connection>,
    table: String,
}

impl SqliteStore {
    /// Open or create the database file described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::InvalidConfig`] for an unusable table name and
    /// [`QuoteError::Backend`] when the file cannot be opened or migrated.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, QuoteError> {
        config.validate()?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(&config.path, flags)
            .map_err(|err| QuoteError::Backend(err.to_string()))?;
        connection
            .execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|err| QuoteError::Backend(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|err| QuoteError::Backend(err.to_string()))?;

        tracing::debug!(path = %config.path.display(), table = %config.table, "opened sqlite quote store");
        Self::with_connection(connection, config.table)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(table: impl Into<String>) -> Result<Self, QuoteError> {
        let table = table.into();
        validate_table_name(&table)?;
        let connection =
            Connection::open_in_memory().map_err(|err| QuoteError::Backend(err.to_string()))?;
        Self::with_connection(connection, table)
    }

    fn with_connection(mut connection: Connection, table: String) -> Result<Self, QuoteError> {
        initialize_schema(&mut connection, &table)?;
        Ok(SqliteStore {
            connection: Mutex::new(connection),
            table,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, QuoteError> {
        self.connection
            .lock()
            .map_err(|_| QuoteError::Backend("sqlite connection mutex poisoned".to_string()))
    }

    fn select(&self) -> String {
        format!("SELECT quote, quotee, quoter, createdAt FROM {}", self.table)
    }
}

fn initialize_schema(connection: &mut Connection, table: &str) -> Result<(), QuoteError> {
    let tx = connection
        .transaction()
        .map_err(|err| QuoteError::Backend(err.to_string()))?;
    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            quote TEXT NOT NULL,
            quotee TEXT NOT NULL,
            quoter TEXT NOT NULL,
            createdAt INTEGER NOT NULL
        );"
    ))
    .map_err(|err| QuoteError::Backend(err.to_string()))?;
    tx.commit()
        .map_err(|err| QuoteError::Backend(err.to_string()))
}

fn validate_table_name(table: &str) -> Result<(), QuoteError> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_start && valid_rest && table.len() <= MAX_TABLE_NAME_LEN {
        Ok(())
    } else {
        Err(QuoteError::InvalidConfig(format!(
            "table name {table:?} is not a plain identifier"
        )))
    }
}

fn to_nanos(time: SystemTime) -> Result<i64, QuoteError> {
    let since_epoch = time
        .duration_since(UNIX_EPOCH)
        .map_err(|_| QuoteError::WriteFailed("created_at precedes the unix epoch".to_string()))?;
    i64::try_from(since_epoch.as_nanos())
        .map_err(|_| QuoteError::WriteFailed("created_at is out of range".to_string()))
}

fn from_nanos(nanos: i64) -> Result<SystemTime, QuoteError> {
    let nanos = u64::try_from(nanos)
        .map_err(|_| QuoteError::Backend(format!("stored createdAt {nanos} is negative")))?;
    Ok(UNIX_EPOCH + Duration::from_nanos(nanos))
}

type RawQuote = (String, String, String, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawQuote> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_quote((quote, quotee, quoter, created_at): RawQuote) -> Result<Quote, QuoteError> {
    Ok(Quote {
        quote,
        quotee,
        quoter,
        created_at: from_nanos(created_at)?,
    })
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl QuoteStore for SqliteStore {
    fn insert(&self, quote: &Quote) -> Result<(), QuoteError> {
        quote.validate()?;
        let created_at = to_nanos(quote.created_at)?;
        let connection = self.connection()?;
        connection
            .execute(
                &format!(
                    "INSERT INTO {} (quote, quotee, quoter, createdAt) VALUES (?1, ?2, ?3, ?4)",
                    self.table
                ),
                params![quote.quote, quote.quotee, quote.quoter, created_at],
            )
            .map_err(|err| QuoteError::WriteFailed(err.to_string()))?;
        Ok(())
    }

    fn latest(&self, scope: &Scope) -> Result<Quote, QuoteError> {
        let connection = self.connection()?;
        let raw = match scope {
            Scope::All => connection.query_row(
                &format!("{} ORDER BY id DESC LIMIT 1", self.select()),
                [],
                read_row,
            ),
            Scope::Quotee(quotee) => connection.query_row(
                &format!("{} WHERE quotee = ?1 ORDER BY id DESC LIMIT 1", self.select()),
                params![quotee],
                read_row,
            ),
        }
        .optional()
        .map_err(|err| QuoteError::Backend(err.to_string()))?;

        raw.map(into_quote)
            .unwrap_or_else(|| Err(QuoteError::not_found(scope)))
    }

    fn at_offset(&self, offset: u64, scope: &Scope) -> Result<Quote, QuoteError> {
        let offset = to_sql_int(offset);
        let connection = self.connection()?;
        let raw = match scope {
            Scope::All => connection.query_row(
                &format!("{} ORDER BY id ASC LIMIT 1 OFFSET ?1", self.select()),
                params![offset],
                read_row,
            ),
            Scope::Quotee(quotee) => connection.query_row(
                &format!(
                    "{} WHERE quotee = ?1 ORDER BY id ASC LIMIT 1 OFFSET ?2",
                    self.select()
                ),
                params![quotee, offset],
                read_row,
            ),
        }
        .optional()
        .map_err(|err| QuoteError::Backend(err.to_string()))?;

        raw.map(into_quote)
            .unwrap_or_else(|| Err(QuoteError::not_found(scope)))
    }

    fn count(&self, scope: &Scope) -> Result<u64, QuoteError> {
        let connection = self.connection()?;
        let total: i64 = match scope {
            Scope::All => connection.query_row(
                &format!("SELECT COUNT(*) FROM {}", self.table),
                [],
                |row| row.get(0),
            ),
            Scope::Quotee(quotee) => connection.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE quotee = ?1", self.table),
                params![quotee],
                |row| row.get(0),
            ),
        }
        .map_err(|err| QuoteError::Backend(err.to_string()))?;

        u64::try_from(total).map_err(|_| QuoteError::Backend(format!("negative count {total}")))
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>, QuoteError> {
        let connection = self.connection()?;
        // Literal substring match; lower() folds ASCII only
        let mut statement = connection
            .prepare_cached(&format!(
                "{} WHERE instr(lower(quote), lower(?1)) > 0 ORDER BY id DESC LIMIT ?2",
                self.select()
            ))
            .map_err(|err| QuoteError::Backend(err.to_string()))?;
        let rows = statement
            .query_map(params![needle, to_sql_int(limit as u64)], read_row)
            .map_err(|err| QuoteError::Backend(err.to_string()))?;

        let mut quotes = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| QuoteError::Backend(err.to_string()))?;
            quotes.push(into_quote(raw)?);
        }
        Ok(quotes)
    }

    fn leaderboard_top(&self, n: usize) -> Result<Vec<(String, u64)>, QuoteError> {
        let connection = self.connection()?;
        let mut statement = connection
            .prepare_cached(&format!(
                "SELECT quotee, COUNT(*) AS total, MIN(id) AS first_id FROM {}
                 GROUP BY quotee ORDER BY total DESC, first_id ASC LIMIT ?1",
                self.table
            ))
            .map_err(|err| QuoteError::Backend(err.to_string()))?;
        let rows = statement
            .query_map(params![to_sql_int(n as u64)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|err| QuoteError::Backend(err.to_string()))?;

        let mut leaders = Vec::new();
        for row in rows {
            let (quotee, total) = row.map_err(|err| QuoteError::Backend(err.to_string()))?;
            let total = u64::try_from(total)
                .map_err(|_| QuoteError::Backend(format!("negative count {total}")))?;
            leaders.push((quotee, total));
        }
        Ok(leaders)
    }
}
