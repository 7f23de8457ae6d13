//! Transport layer implementations for the quote server
//!
//! A transport accepts commands from a chat gateway adapter and forwards
//! them to the [`CommandRouter`], which shares one quote book actor across
//! every connection.
//!
//! # Available Transports
//!
//! - [`http`]: REST API with JSON (easy integration)

pub mod http;


use crate::command::CommandRouter;
use anyhow::Result;
use async_trait::async_trait;

/// Common interface for all transport implementations
///
/// Each transport is responsible for:
/// - Accepting client connections
/// - Parsing protocol-specific requests into commands
/// - Forwarding commands to the router
/// - Sending replies back to clients
#[async_trait]
pub trait Transport {
    /// Start the transport server
    ///
    /// Runs until an error occurs or the process receives a shutdown signal.
    async fn start(self, router: CommandRouter) -> Result<()>;
}
