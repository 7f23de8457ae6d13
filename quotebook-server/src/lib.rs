//! # Quotebook Server
//!
//! A standalone service that backs a chat quote bot: it stores quotes said by
//! users and answers the bot's slash commands.
//!
//! ## Purpose
//!
//! A chat gateway adapter resolves each slash command (user options, the
//! invoking user, the interaction timestamp) and posts it to this server. The
//! server runs the command against a shared quote book and returns a rendered
//! reply the adapter can display as-is.
//!
//! - `/add quote user` stores a quote attributed to a user
//! - `/random [user]` and `/latest [user]` show one quote
//! - `/count` reports the collection size
//! - `/search text` lists up to ten matching quotes
//! - `/leaderboard` ranks the ten most quoted users
//!
//! ## Quick Start
//!
//! ```bash
//! # Show all available options
//! quotebook --help
//!
//! # Persist quotes to ./quotes.db, listen on port 8080
//! quotebook --http-port 8080 --sqlite-path quotes.db
//!
//! # Keep everything in memory
//! quotebook --store memory
//! ```
//!
//! ## Configuration
//!
//! Configure via CLI arguments or environment variables (CLI takes precedence):
//!
//! ```bash
//! export QUOTEBOOK_TABLE=quotes
//! export QUOTEBOOK_MAINTAINER_ID=1234
//! quotebook
//!
//! # List all available environment variables
//! quotebook --list-env-vars
//! ```
//!
//! ### Key Configuration Options
//!
//! - **Store Type**: `--store sqlite|memory`
//! - **Table**: `--table quotes` (letters, digits and underscores)
//! - **Count TTL**: `--count-ttl-secs 3600`
//! - **Request Timeout**: `--request-timeout-secs 10`
//! - **Race Policy**: `--race-policy surface|retry-once`
//! - **Log Level**: `--log-level error|warn|info|debug|trace`
//!
//! ## Client Example
//!
//! ```bash
//! curl -X POST http://localhost:8080/command \
//!   -H "Content-Type: application/json" \
//!   -d '{"command": "random", "user": "1234"}'
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────┐
//!   │    HTTP     │
//!   │  Transport  │
//!   └──────┬──────┘
//!          │
//!   ┌──────▼──────┐
//!   │   Command   │
//!   │   Router    │
//!   └──────┬──────┘
//!          │  bounded by request timeout
//!   ┌──────▼──────┐
//!   │    Actor    │
//!   │ (QuoteBook) │
//!   └──────┬──────┘
//!          │
//!   ┌──────▼──────┐
//!   │ QuoteStore  │
//!   └─────────────┘
//! ```
//!
//! The actor owns the quote book and processes one message at a time on a
//! blocking thread, so the count cache and sampler never see concurrent
//! access from this process.

pub mod actor;
pub mod command;
pub mod config;
pub mod metrics;
pub mod store;
pub mod transport;
pub mod types;
