//! Common types used across the server
//!
//! This module defines the command and reply types exchanged between a chat
//! gateway adapter and the server. A gateway resolves a slash command into a
//! [`Command`], posts it, and renders the returned [`Reply`].
//!
//! # Example
//!
//! ```json
//! { "command": "random", "user": "1234" }
//! ```
//!
//! ```json
//! {
//!   "embeds": [{
//!     "title": "Random Quote",
//!     "fields": [
//!       { "name": "Quote", "value": "ship it" },
//!       { "name": "Quotee", "value": "<@1234>" },
//!       { "name": "Quoter", "value": "<@42>" },
//!       { "name": "Created At", "value": "Tue, 14 Nov 2023 22:13:20 +0000" }
//!     ]
//!   }],
//!   "ephemeral": false
//! }
//! ```

use crate::metrics::CommandKind;
use serde::{Deserialize, Serialize};

/// A resolved slash command
///
/// User identifiers are raw platform IDs; the server wraps them into mention
/// tokens (`<@id>`) before they reach the quote book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Store a new quote
    Add {
        quote: String,
        quotee: String,
        quoter: String,
        /// Submission time of the originating interaction, Unix milliseconds
        submitted_at_ms: u64,
    },
    /// Random quote, optionally restricted to one quotee
    Random {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
    /// Most recent quote, optionally restricted to one quotee
    Latest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },
    /// Total number of quotes
    Count,
    /// Substring search over quote text
    Search { query: String },
    /// Most quoted users
    Leaderboard,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Add { .. } => CommandKind::Add,
            Command::Random { .. } => CommandKind::Random,
            Command::Latest { .. } => CommandKind::Latest,
            Command::Count => CommandKind::Count,
            Command::Search { .. } => CommandKind::Search,
            Command::Leaderboard => CommandKind::Leaderboard,
        }
    }
}

/// Rendered response to a command
///
/// `ephemeral` replies should be shown only to the invoking user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub ephemeral: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self::embeds(vec![embed])
    }

    pub fn embeds(embeds: Vec<Embed>) -> Self {
        Reply {
            embeds,
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

/// Titled block of named fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Embed {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Value of the first field called `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}
