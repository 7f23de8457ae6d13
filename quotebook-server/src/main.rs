use anyhow::Result;
use std::sync::Arc;

use quotebook_server::command::CommandRouter;
use quotebook_server::config::Config;
use quotebook_server::metrics::Metrics;
use quotebook_server::store;
use quotebook_server::transport::{Transport, http::HttpTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("quotebook={}", config.log_level).parse()?)
                .add_directive(format!("quotebook_server={}", config.log_level).parse()?),
        )
        .init();

    let handle = store::create_quote_book(&config.store, &config.book, config.buffer_size)?;
    let router = CommandRouter::new(handle, Arc::new(Metrics::new()), config.maintainer_id);

    tracing::info!(
        "Quotebook server started with store type: {}",
        config.store.store_type
    );
    tracing::info!(
        "Table: {}, Count TTL: {:?}, Request timeout: {:?}, Race policy: {}",
        config.store.table,
        config.book.count_ttl,
        config.book.request_timeout,
        config.book.race_policy
    );

    tracing::info!(
        "Starting HTTP transport on {}:{}",
        config.http.host,
        config.http.port
    );
    let transport = HttpTransport::new(&config.http.host, config.http.port);
    if let Err(e) = transport.start(router).await {
        tracing::error!("Transport failed: {}", e);
        return Err(e);
    }

    Ok(())
}
