use quotebook::{LeaderboardRow, Quote, QuoteBook, QuoteError, QuoteQuery, QuoteStore, Scope};
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, oneshot};

type Responder<T> = oneshot::Sender<Result<T, QuoteError>>;

/// Message types for the quote book actor
pub enum QuoteBookMessage {
    Add {
        quote: Quote,
        response_tx: Responder<()>,
    },
    Query {
        query: QuoteQuery,
        response_tx: Responder<Quote>,
    },
    Count {
        response_tx: Responder<u64>,
    },
    Search {
        text: String,
        response_tx: Responder<Vec<Quote>>,
    },
    Leaderboard {
        response_tx: Responder<Vec<LeaderboardRow>>,
    },
}

impl QuoteBookMessage {
    fn name(&self) -> &'static str {
        match self {
            QuoteBookMessage::Add { .. } => "add",
            QuoteBookMessage::Query {
                query: QuoteQuery::Random(_),
                ..
            } => "random",
            QuoteBookMessage::Query {
                query: QuoteQuery::Latest(_),
                ..
            } => "latest",
            QuoteBookMessage::Count { .. } => "count",
            QuoteBookMessage::Search { .. } => "search",
            QuoteBookMessage::Leaderboard { .. } => "leaderboard",
        }
    }
}

/// Handle to communicate with the quote book actor
///
/// Every call is bounded by the handle's timeout. A call that times out
/// returns [`QuoteError::Timeout`]; the actor still finishes the operation,
/// so an insert that was already running lands and invalidates the count.
#[derive(Clone)]
pub struct QuoteBookHandle {
    tx: mpsc::Sender<QuoteBookMessage>,
    timeout: Duration,
}

impl QuoteBookHandle {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Store a quote
    pub async fn add(&self, quote: Quote) -> Result<(), QuoteError> {
        self.call(|response_tx| QuoteBookMessage::Add { quote, response_tx })
            .await
    }

    /// Random quote within the scope
    pub async fn random(&self, scope: Scope) -> Result<Quote, QuoteError> {
        self.call(|response_tx| QuoteBookMessage::Query {
            query: QuoteQuery::Random(scope),
            response_tx,
        })
        .await
    }

    /// Most recent quote within the scope
    pub async fn latest(&self, scope: Scope) -> Result<Quote, QuoteError> {
        self.call(|response_tx| QuoteBookMessage::Query {
            query: QuoteQuery::Latest(scope),
            response_tx,
        })
        .await
    }

    /// Total number of quotes
    pub async fn count(&self) -> Result<u64, QuoteError> {
        self.call(|response_tx| QuoteBookMessage::Count { response_tx })
            .await
    }

    /// Quotes containing `text`, newest first
    pub async fn search(&self, text: String) -> Result<Vec<Quote>, QuoteError> {
        self.call(|response_tx| QuoteBookMessage::Search { text, response_tx })
            .await
    }

    /// Most quoted users
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, QuoteError> {
        self.call(|response_tx| QuoteBookMessage::Leaderboard { response_tx })
            .await
    }

    async fn call<T>(
        &self,
        message: impl FnOnce(Responder<T>) -> QuoteBookMessage,
    ) -> Result<T, QuoteError> {
        let (response_tx, response_rx) = oneshot::channel();
        let message = message(response_tx);
        let operation = message.name();

        let exchange = async {
            self.tx.send(message).await.map_err(|_| {
                QuoteError::Backend("Quote book actor has shut down".to_string())
            })?;

            response_rx.await.map_err(|_| {
                QuoteError::Backend("Quote book actor dropped response channel".to_string())
            })?
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "quote book call timed out"
                );
                Err(QuoteError::Timeout(self.timeout))
            }
        }
    }
}

/// The quote book actor
///
/// Owns the [`QuoteBook`] on a dedicated blocking thread and serves one
/// message at a time, so store calls never block the async runtime and the
/// count cache has a single owner.
pub struct QuoteBookActor;

impl QuoteBookActor {
    /// Spawn an actor that owns `book`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S>(buffer_size: usize, book: QuoteBook<S>, timeout: Duration) -> QuoteBookHandle
    where
        S: QuoteStore + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer_size);

        tokio::task::spawn_blocking(move || run_actor(rx, book));

        QuoteBookHandle { tx, timeout }
    }
}

fn run_actor<S: QuoteStore>(mut rx: mpsc::Receiver<QuoteBookMessage>, book: QuoteBook<S>) {
    while let Some(msg) = rx.blocking_recv() {
        // Ignore send errors - receiver may have timed out
        match msg {
            QuoteBookMessage::Add { quote, response_tx } => {
                let _ = response_tx.send(book.add(quote));
            }
            QuoteBookMessage::Query { query, response_tx } => {
                let _ = response_tx.send(book.query(&query, SystemTime::now()));
            }
            QuoteBookMessage::Count { response_tx } => {
                let _ = response_tx.send(book.count(SystemTime::now()));
            }
            QuoteBookMessage::Search { text, response_tx } => {
                let _ = response_tx.send(book.search(&text));
            }
            QuoteBookMessage::Leaderboard { response_tx } => {
                let _ = response_tx.send(book.leaderboard());
            }
        }
    }

    tracing::info!("Quote book actor shutting down");
}
