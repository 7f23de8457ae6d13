//! Simple metrics collection for observability
//!
//! This module provides lightweight metrics collection using atomic counters.
//! Designed for minimal overhead and zero allocations in the hot path.

use quotebook::QuoteError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Command kinds tracked by the metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Add,
    Random,
    Latest,
    Count,
    Search,
    Leaderboard,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::Add,
        CommandKind::Random,
        CommandKind::Latest,
        CommandKind::Count,
        CommandKind::Search,
        CommandKind::Leaderboard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Add => "add",
            CommandKind::Random => "random",
            CommandKind::Latest => "latest",
            CommandKind::Count => "count",
            CommandKind::Search => "search",
            CommandKind::Leaderboard => "leaderboard",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command produced its normal reply
    Ok,
    /// Nothing matched
    NotFound,
    /// The input was rejected before reaching the store
    Rejected,
    /// The store failed
    Failed,
    /// The store call exceeded its time bound
    Timeout,
}

impl Outcome {
    pub fn from_error(err: &QuoteError) -> Self {
        match err {
            QuoteError::NotFound { .. } | QuoteError::EmptyPopulation { .. } => Outcome::NotFound,
            QuoteError::InvalidQuote(_) => Outcome::Rejected,
            QuoteError::Timeout(_) => Outcome::Timeout,
            QuoteError::InvalidConfig(_) | QuoteError::WriteFailed(_) | QuoteError::Backend(_) => {
                Outcome::Failed
            }
        }
    }
}

/// Core metrics collected by the server
pub struct Metrics {
    /// Server start time
    start_time: Instant,

    /// Total commands received
    pub total_requests: AtomicU64,

    /// Commands by kind, indexed by [`CommandKind`]
    commands: [AtomicU64; 6],

    /// Command outcomes
    pub requests_ok: AtomicU64,
    pub requests_not_found: AtomicU64,
    pub requests_rejected: AtomicU64,
    pub requests_failed: AtomicU64,
    pub requests_timeout: AtomicU64,

    /// Request latency buckets (in microseconds)
    pub latency_under_1ms: AtomicU64,
    pub latency_under_10ms: AtomicU64,
    pub latency_under_100ms: AtomicU64,
    pub latency_under_1s: AtomicU64,
    pub latency_over_1s: AtomicU64,

    /// Histogram support
    pub latency_sum_micros: AtomicU64,
    pub latency_count: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            commands: Default::default(),
            requests_ok: AtomicU64::new(0),
            requests_not_found: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_timeout: AtomicU64::new(0),
            latency_under_1ms: AtomicU64::new(0),
            latency_under_10ms: AtomicU64::new(0),
            latency_under_100ms: AtomicU64::new(0),
            latency_under_1s: AtomicU64::new(0),
            latency_over_1s: AtomicU64::new(0),
            latency_sum_micros: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
        }
    }

    /// Record a finished command and its latency
    pub fn record_command(&self, kind: CommandKind, outcome: Outcome, latency_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.commands[kind.index()].fetch_add(1, Ordering::Relaxed);

        match outcome {
            Outcome::Ok => self.requests_ok.fetch_add(1, Ordering::Relaxed),
            Outcome::NotFound => self.requests_not_found.fetch_add(1, Ordering::Relaxed),
            Outcome::Rejected => self.requests_rejected.fetch_add(1, Ordering::Relaxed),
            Outcome::Failed => self.requests_failed.fetch_add(1, Ordering::Relaxed),
            Outcome::Timeout => self.requests_timeout.fetch_add(1, Ordering::Relaxed),
        };

        // Record latency bucket
        match latency_us {
            0..=999 => self.latency_under_1ms.fetch_add(1, Ordering::Relaxed),
            1000..=9999 => self.latency_under_10ms.fetch_add(1, Ordering::Relaxed),
            10000..=99999 => self.latency_under_100ms.fetch_add(1, Ordering::Relaxed),
            100000..=999999 => self.latency_under_1s.fetch_add(1, Ordering::Relaxed),
            _ => self.latency_over_1s.fetch_add(1, Ordering::Relaxed),
        };

        // Update histogram metrics
        self.latency_sum_micros
            .fetch_add(latency_us, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of commands of one kind seen so far
    pub fn command_count(&self, kind: CommandKind) -> u64 {
        self.commands[kind.index()].load(Ordering::Relaxed)
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        output.push_str("# HELP quotebook_uptime_seconds Time since server start in seconds\n");
        output.push_str("# TYPE quotebook_uptime_seconds gauge\n");
        output.push_str(&format!(
            "quotebook_uptime_seconds {}\n\n",
            self.uptime_seconds()
        ));

        output.push_str("# HELP quotebook_requests_total Total number of commands processed\n");
        output.push_str("# TYPE quotebook_requests_total counter\n");
        output.push_str(&format!(
            "quotebook_requests_total {}\n\n",
            self.total_requests.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP quotebook_requests_by_command Total commands by kind\n");
        output.push_str("# TYPE quotebook_requests_by_command counter\n");
        for kind in CommandKind::ALL {
            output.push_str(&format!(
                "quotebook_requests_by_command{{command=\"{}\"}} {}\n",
                kind.as_str(),
                self.command_count(kind)
            ));
        }
        output.push('\n');

        output.push_str("# HELP quotebook_requests_by_outcome Total commands by outcome\n");
        output.push_str("# TYPE quotebook_requests_by_outcome counter\n");
        let outcomes = [
            ("ok", &self.requests_ok),
            ("not_found", &self.requests_not_found),
            ("rejected", &self.requests_rejected),
            ("failed", &self.requests_failed),
            ("timeout", &self.requests_timeout),
        ];
        for (label, counter) in outcomes {
            output.push_str(&format!(
                "quotebook_requests_by_outcome{{outcome=\"{label}\"}} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        output.push('\n');

        // Latency distribution
        let under_1ms = self.latency_under_1ms.load(Ordering::Relaxed);
        let under_10ms = under_1ms + self.latency_under_10ms.load(Ordering::Relaxed);
        let under_100ms = under_10ms + self.latency_under_100ms.load(Ordering::Relaxed);
        let under_1s = under_100ms + self.latency_under_1s.load(Ordering::Relaxed);

        output.push_str("# HELP quotebook_request_duration_bucket Command latency distribution\n");
        output.push_str("# TYPE quotebook_request_duration_bucket histogram\n");
        for (le, value) in [
            ("0.001", under_1ms),
            ("0.01", under_10ms),
            ("0.1", under_100ms),
            ("1", under_1s),
        ] {
            output.push_str(&format!(
                "quotebook_request_duration_bucket{{le=\"{le}\"}} {value}\n"
            ));
        }
        output.push_str(&format!(
            "quotebook_request_duration_bucket{{le=\"+Inf\"}} {}\n",
            self.total_requests.load(Ordering::Relaxed)
        ));

        // Add sum and count for proper histogram
        let latency_sum_seconds =
            self.latency_sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        output.push_str(&format!(
            "quotebook_request_duration_sum {latency_sum_seconds:.6}\n"
        ));
        output.push_str(&format!(
            "quotebook_request_duration_count {}\n",
            self.latency_count.load(Ordering::Relaxed)
        ));

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
