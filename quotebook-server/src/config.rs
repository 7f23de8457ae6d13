//! Server configuration and CLI argument parsing
//!
//! This module handles all server configuration through a flexible system that supports:
//! - Command-line arguments
//! - Environment variables (with QUOTEBOOK_ prefix)
//!
//! # Configuration Priority
//!
//! The configuration system follows this precedence order:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Default values (lowest priority)
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! quotebook --store sqlite --sqlite-path /var/lib/quotebook/quotes.db
//!
//! # Using environment variables
//! export QUOTEBOOK_STORE=sqlite
//! export QUOTEBOOK_TABLE=guild_quotes
//! export QUOTEBOOK_MAINTAINER_ID=1234567890
//! quotebook
//!
//! # Mixed (CLI overrides env)
//! export QUOTEBOOK_HTTP_PORT=8080
//! quotebook --http-port 9090  # Uses port 9090
//! ```

use anyhow::{Result, anyhow};
use clap::Parser;
use quotebook::{RacePolicy, SqliteStoreConfig};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the server
///
/// This structure is built from CLI arguments and environment variables,
/// and contains all settings needed to run the server.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP transport configuration
    pub http: HttpConfig,
    /// Quote store configuration
    pub store: StoreConfig,
    /// Quote book behavior
    pub book: BookConfig,
    /// User to name in failure replies
    pub maintainer_id: Option<String>,
    /// Channel buffer size for actor communication
    pub buffer_size: usize,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Quote store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Type of store to use
    pub store_type: StoreType,
    /// SQLite database file
    pub sqlite_path: PathBuf,
    /// SQLite table holding the quotes
    pub table: String,
    /// SQLite busy timeout in milliseconds
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    pub fn sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig::new(&self.sqlite_path)
            .table(&self.table)
            .busy_timeout_ms(self.busy_timeout_ms)
    }
}

/// Quote book behavior
#[derive(Debug, Clone)]
pub struct BookConfig {
    /// How long the cached total count stays valid
    pub count_ttl: Duration,
    /// Upper bound on every store call made for a command
    pub request_timeout: Duration,
    /// Handling of a sampled offset that falls past the end
    pub race_policy: RacePolicy,
}

/// Available store types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// Process memory, lost on restart
    Memory,
    /// SQLite database file
    Sqlite,
}

impl std::str::FromStr for StoreType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreType::Memory),
            "sqlite" => Ok(StoreType::Sqlite),
            _ => Err(anyhow!(
                "Invalid store type: {}. Valid options are: memory, sqlite",
                s
            )),
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::Memory => write!(f, "memory"),
            StoreType::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// QUOTEBOOK_ prefix. CLI arguments take precedence over environment variables.
///
/// # Examples
///
/// In-memory store for local testing:
/// ```bash
/// quotebook --store memory --log-level debug
/// ```
///
/// Persistent store with a faster count refresh:
/// ```bash
/// quotebook --sqlite-path quotes.db --count-ttl-secs 600
/// ```
#[derive(Parser, Debug)]
#[command(
    name = "quotebook",
    about = "Quote bot service",
    long_about = "Stores chat quotes and serves random, latest, search, count and leaderboard commands over HTTP/JSON.\n\nEnvironment variables with QUOTEBOOK_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    // HTTP Transport
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host",
        default_value = "127.0.0.1",
        env = "QUOTEBOOK_HTTP_HOST"
    )]
    pub http_host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port",
        default_value_t = 8080,
        env = "QUOTEBOOK_HTTP_PORT"
    )]
    pub http_port: u16,

    // Store Configuration
    #[arg(
        long,
        value_name = "TYPE",
        help = "Store type: memory, sqlite",
        default_value = "sqlite",
        env = "QUOTEBOOK_STORE"
    )]
    pub store: StoreType,
    #[arg(
        long,
        value_name = "PATH",
        help = "SQLite database file",
        default_value = "quotes.db",
        env = "QUOTEBOOK_SQLITE_PATH"
    )]
    pub sqlite_path: PathBuf,
    #[arg(
        long,
        value_name = "NAME",
        help = "SQLite table holding the quotes",
        default_value = "quotes",
        env = "QUOTEBOOK_TABLE"
    )]
    pub table: String,
    #[arg(
        long,
        value_name = "MS",
        help = "SQLite busy timeout in milliseconds",
        default_value_t = 5_000,
        env = "QUOTEBOOK_BUSY_TIMEOUT_MS"
    )]
    pub busy_timeout_ms: u64,

    // Quote book behavior
    #[arg(
        long,
        value_name = "SECS",
        help = "How long the cached quote count stays valid (seconds)",
        default_value_t = 3_600,
        env = "QUOTEBOOK_COUNT_TTL_SECS"
    )]
    pub count_ttl_secs: u64,
    #[arg(
        long,
        value_name = "SECS",
        help = "Upper bound on store calls made for one command (seconds)",
        default_value_t = 10,
        env = "QUOTEBOOK_REQUEST_TIMEOUT_SECS"
    )]
    pub request_timeout_secs: u64,
    #[arg(
        long,
        value_name = "POLICY",
        help = "Sampling race policy: surface, retry-once",
        default_value = "surface",
        env = "QUOTEBOOK_RACE_POLICY"
    )]
    pub race_policy: RacePolicy,
    #[arg(
        long,
        value_name = "USER_ID",
        help = "User to contact when a command fails",
        env = "QUOTEBOOK_MAINTAINER_ID"
    )]
    pub maintainer_id: Option<String>,

    // General options
    #[arg(
        long,
        value_name = "SIZE",
        help = "Channel buffer size",
        default_value_t = 1_024,
        env = "QUOTEBOOK_BUFFER_SIZE"
    )]
    pub buffer_size: usize,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "QUOTEBOOK_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// Handles `--list-env-vars` by printing the variable reference and
    /// exiting the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration fails validation.
    pub fn from_env_and_args() -> Result<Self> {
        // Clap resolves CLI > env > default for every argument
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        Self::from_args(args)
    }

    /// Build and validate configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let config = Config {
            http: HttpConfig {
                host: args.http_host,
                port: args.http_port,
            },
            store: StoreConfig {
                store_type: args.store,
                sqlite_path: args.sqlite_path,
                table: args.table,
                busy_timeout_ms: args.busy_timeout_ms,
            },
            book: BookConfig {
                count_ttl: Duration::from_secs(args.count_ttl_secs),
                request_timeout: Duration::from_secs(args.request_timeout_secs),
                race_policy: args.race_policy,
            },
            maintainer_id: args.maintainer_id.filter(|id| !id.trim().is_empty()),
            buffer_size: args.buffer_size,
            log_level: args.log_level,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is not a plain identifier or a
    /// duration or buffer size is zero.
    fn validate(&self) -> Result<()> {
        if self.store.store_type == StoreType::Sqlite {
            self.store
                .sqlite_config()
                .validate()
                .map_err(|e| anyhow!("{e}. Use --table with letters, digits and underscores"))?;
        }
        if self.book.count_ttl.is_zero() {
            return Err(anyhow!("--count-ttl-secs must be greater than zero"));
        }
        if self.book.request_timeout.is_zero() {
            return Err(anyhow!("--request-timeout-secs must be greater than zero"));
        }
        if self.buffer_size == 0 {
            return Err(anyhow!("--buffer-size must be greater than zero"));
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    ///
    /// This is called when the --list-env-vars flag is used.
    fn print_env_vars() {
        println!("Quotebook Environment Variables");
        println!("===============================");
        println!();
        println!("All environment variables use the QUOTEBOOK_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("Transport Configuration:");
        println!("  QUOTEBOOK_HTTP_HOST=<host>            HTTP host [default: 127.0.0.1]");
        println!("  QUOTEBOOK_HTTP_PORT=<port>            HTTP port [default: 8080]");
        println!();

        println!("Store Configuration:");
        println!(
            "  QUOTEBOOK_STORE=<type>                Store type: memory, sqlite [default: sqlite]"
        );
        println!(
            "  QUOTEBOOK_SQLITE_PATH=<path>          SQLite database file [default: quotes.db]"
        );
        println!("  QUOTEBOOK_TABLE=<name>                SQLite table name [default: quotes]");
        println!(
            "  QUOTEBOOK_BUSY_TIMEOUT_MS=<ms>        SQLite busy timeout [default: 5000]"
        );
        println!();

        println!("Quote Book Configuration:");
        println!(
            "  QUOTEBOOK_COUNT_TTL_SECS=<secs>       Cached count lifetime [default: 3600]"
        );
        println!(
            "  QUOTEBOOK_REQUEST_TIMEOUT_SECS=<secs> Per-command store timeout [default: 10]"
        );
        println!(
            "  QUOTEBOOK_RACE_POLICY=<policy>        Sampling race policy: surface, retry-once [default: surface]"
        );
        println!(
            "  QUOTEBOOK_MAINTAINER_ID=<user_id>     User named in failure replies [default: none]"
        );
        println!();

        println!("General Configuration:");
        println!("  QUOTEBOOK_BUFFER_SIZE=<size>          Channel buffer size [default: 1024]");
        println!(
            "  QUOTEBOOK_LOG_LEVEL=<level>           Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  # Persist quotes in a custom table");
        println!("  export QUOTEBOOK_SQLITE_PATH=/var/lib/quotebook/quotes.db");
        println!("  export QUOTEBOOK_TABLE=guild_quotes");
        println!();
        println!("  # Run server (CLI args override env vars)");
        println!("  quotebook --http-port 9090");
    }
}
