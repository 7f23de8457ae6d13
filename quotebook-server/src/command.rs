//! Command execution and reply rendering
//!
//! [`CommandRouter`] turns a resolved [`Command`] into quote book calls and
//! renders the outcome as a [`Reply`]. This is the only place where a
//! [`QuoteError`] becomes user-visible text:
//!
//! - nothing matched: "No quotes found for ..."
//! - invalid input: an ephemeral explanation
//! - store failure or timeout: an ephemeral apology naming the maintainer

use crate::actor::QuoteBookHandle;
use crate::metrics::{CommandKind, Metrics, Outcome};
use crate::types::{Command, Embed, Reply};
use chrono::{DateTime, Utc};
use quotebook::{Quote, QuoteError, Scope, leaderboard};
use std::sync::Arc;
use std::time::{Duration, Instant, UNIX_EPOCH};

/// Wrap a raw user ID as a mention token; tokens pass through unchanged.
pub fn mention(user_id: &str) -> String {
    let user_id = user_id.trim();
    if user_id.starts_with("<@") && user_id.ends_with('>') {
        user_id.to_string()
    } else {
        format!("<@{user_id}>")
    }
}

/// Render a quote as an embed titled `title`
pub fn quote_embed(title: impl Into<String>, quote: &Quote) -> Embed {
    let created_at: DateTime<Utc> = quote.created_at.into();
    Embed::new(title)
        .field("Quote", &quote.quote)
        .field("Quotee", &quote.quotee)
        .field("Quoter", &quote.quoter)
        .field("Created At", created_at.to_rfc2822())
}

/// Executes commands against the quote book actor
#[derive(Clone)]
pub struct CommandRouter {
    handle: QuoteBookHandle,
    metrics: Arc<Metrics>,
    maintainer_id: Option<String>,
}

impl CommandRouter {
    pub fn new(
        handle: QuoteBookHandle,
        metrics: Arc<Metrics>,
        maintainer_id: Option<String>,
    ) -> Self {
        CommandRouter {
            handle,
            metrics,
            maintainer_id,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run one command and render its reply
    ///
    /// Never fails: errors are rendered into the reply and recorded in the
    /// metrics.
    pub async fn execute(&self, command: Command) -> Reply {
        let kind = command.kind();
        let start = Instant::now();

        let (reply, outcome) = match self.dispatch(command).await {
            Ok(reply) => (reply, Outcome::Ok),
            Err(err) => (self.error_reply(kind, &err), Outcome::from_error(&err)),
        };

        let latency_us = start.elapsed().as_micros() as u64;
        self.metrics.record_command(kind, outcome, latency_us);
        tracing::debug!(command = kind.as_str(), ?outcome, latency_us, "command executed");

        reply
    }

    async fn dispatch(&self, command: Command) -> Result<Reply, QuoteError> {
        match command {
            Command::Add {
                quote,
                quotee,
                quoter,
                submitted_at_ms,
            } => {
                let created_at = UNIX_EPOCH
                    .checked_add(Duration::from_millis(submitted_at_ms))
                    .ok_or_else(|| {
                        QuoteError::InvalidQuote("submission time is out of range".to_string())
                    })?;
                let quote = Quote::new(quote, mention(&quotee), mention(&quoter), created_at);
                self.handle.add(quote.clone()).await?;
                Ok(Reply::embed(quote_embed("Added Quote", &quote)))
            }
            Command::Random { user } => {
                let scope = Scope::from_quotee(user.as_deref().map(mention));
                let quote = self.handle.random(scope).await?;
                Ok(Reply::embed(quote_embed("Random Quote", &quote)))
            }
            Command::Latest { user } => {
                let scope = Scope::from_quotee(user.as_deref().map(mention));
                let quote = self.handle.latest(scope).await?;
                Ok(Reply::embed(quote_embed("Latest Quote", &quote)))
            }
            Command::Count => {
                let total = self.handle.count().await?;
                let content = match total {
                    1 => "There is 1 quote in the collection".to_string(),
                    n => format!("There are {n} quotes in the collection"),
                };
                Ok(Reply::text(content))
            }
            Command::Search { query } => {
                let results = self.handle.search(query.clone()).await?;
                if results.is_empty() {
                    return Ok(Reply::text(format!("No quotes found matching \"{query}\"")));
                }
                let embeds = results
                    .iter()
                    .enumerate()
                    .map(|(i, quote)| quote_embed(format!("Search Result {}", i + 1), quote))
                    .collect();
                Ok(Reply::embeds(embeds))
            }
            Command::Leaderboard => {
                let rows = self.handle.leaderboard().await?;
                if rows.is_empty() {
                    return Ok(Reply::text("No quotes have been added yet"));
                }
                Ok(Reply::embed(
                    Embed::new("Quote Leaderboard").field("Most Quoted", leaderboard::render(&rows)),
                ))
            }
        }
    }

    fn error_reply(&self, kind: CommandKind, err: &QuoteError) -> Reply {
        match err {
            QuoteError::NotFound { scope } => not_found_reply(&scope.to_string()),
            QuoteError::EmptyPopulation { quotee } => not_found_reply(quotee),
            QuoteError::InvalidQuote(reason) => {
                Reply::text(format!("That quote could not be saved: {reason}")).ephemeral()
            }
            QuoteError::Timeout(timeout) => {
                tracing::warn!(
                    command = kind.as_str(),
                    timeout_ms = timeout.as_millis() as u64,
                    "command timed out"
                );
                self.failure_reply(err)
            }
            QuoteError::InvalidConfig(_) | QuoteError::WriteFailed(_) | QuoteError::Backend(_) => {
                tracing::error!(command = kind.as_str(), error = %err, "command failed");
                self.failure_reply(err)
            }
        }
    }

    fn failure_reply(&self, err: &QuoteError) -> Reply {
        let contact = match &self.maintainer_id {
            Some(id) => mention(id),
            None => "the bot maintainer".to_string(),
        };
        Reply::text(format!(
            "Error executing command, please try again. If this persists please contact {contact} with the error message.\nError message: {err}"
        ))
        .ephemeral()
    }
}

fn not_found_reply(target: &str) -> Reply {
    Reply::embed(Embed::new("No Quotes Found").field("Message", format!("No quotes found for {target}")))
}
