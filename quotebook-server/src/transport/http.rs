//! HTTP/JSON transport for chat gateway adapters
//!
//! # API Endpoints
//!
//! ## POST /command
//!
//! Execute one resolved slash command.
//!
//! ### Request Body
//!
//! ```json
//! {
//!   "command": "add",
//!   "quote": "it works on my machine",
//!   "quotee": "1234",
//!   "quoter": "5678",
//!   "submitted_at_ms": 1700000000000
//! }
//! ```
//!
//! Other commands: `{"command":"random","user":"1234"}`,
//! `{"command":"latest"}`, `{"command":"count"}`,
//! `{"command":"search","query":"machine"}`, `{"command":"leaderboard"}`.
//!
//! ### Response
//!
//! A [`Reply`] with 200 status, including when the command failed; failures
//! are rendered as ephemeral text. Malformed bodies are rejected with a 4xx
//! status before reaching the router.
//!
//! ## GET /health
//!
//! Health check endpoint. Returns "OK" with 200 status.
//!
//! ## GET /metrics
//!
//! Prometheus text exposition of the server metrics.

use super::Transport;
use crate::command::CommandRouter;
use crate::types::{Command, Reply};
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use tokio::net::TcpListener;

/// HTTP transport implementation
pub struct HttpTransport {
    host: String,
    port: u16,
}

impl HttpTransport {
    /// `host` may be an IP address or a hostname such as `localhost`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }

    /// Resolve the configured address and bind a listener
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not resolve or the port cannot be bound.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = format!("{}:{}", self.host, self.port);
        TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP listener on {addr}"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(self, router: CommandRouter) -> Result<()> {
        let app = app(router);

        let listener = self.bind().await?;
        tracing::info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the HTTP routes around a command router
pub fn app(router: CommandRouter) -> Router {
    Router::new()
        .route("/command", post(handle_command))
        .route("/health", get(|| async { "OK" }))
        .route("/metrics", get(handle_metrics))
        .with_state(router)
}

async fn handle_command(
    State(router): State<CommandRouter>,
    Json(command): Json<Command>,
) -> Json<Reply> {
    Json(router.execute(command).await)
}

async fn handle_metrics(State(router): State<CommandRouter>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        router.metrics().export_prometheus(),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
