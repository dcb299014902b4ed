//! Query metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for query execution and continuation tokens
///
/// # Thread Safety
///
/// Counters are atomics with Relaxed ordering; readers see eventually
/// consistent values.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Queries run against a source
    queries_executed: AtomicU64,
    /// Queries aborted by cancellation
    queries_cancelled: AtomicU64,
    /// Pages that had a further page behind them
    next_pages: AtomicU64,
    /// Tokens built
    tokens_issued: AtomicU64,
    /// Tokens accepted on resume
    tokens_resumed: AtomicU64,
    /// Tokens refused on resume
    tokens_rejected: AtomicU64,
    /// Cached tokens removed by expiry or capacity
    tokens_evicted: AtomicU64,
    /// Comparisons dropped during filter compilation
    filter_clauses_dropped: AtomicU64,
    /// Filter arguments or groups ignored for unsupported operators
    filter_arguments_ignored: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Execution

    /// Increment queries executed
    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries cancelled
    pub fn increment_queries_cancelled(&self) {
        self.queries_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment pages with a next link
    pub fn increment_next_pages(&self) {
        self.next_pages.fetch_add(1, Ordering::Relaxed);
    }

    // Tokens

    /// Increment tokens issued
    pub fn increment_tokens_issued(&self) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment tokens resumed
    pub fn increment_tokens_resumed(&self) {
        self.tokens_resumed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment tokens rejected
    pub fn increment_tokens_rejected(&self) {
        self.tokens_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Add evicted cache entries
    pub fn add_tokens_evicted(&self, count: u64) {
        self.tokens_evicted.fetch_add(count, Ordering::Relaxed);
    }

    // Filter compilation

    /// Add dropped filter comparisons
    pub fn add_filter_clauses_dropped(&self, count: u64) {
        self.filter_clauses_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Add ignored filter arguments and groups
    pub fn add_filter_arguments_ignored(&self, count: u64) {
        self.filter_arguments_ignored
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_cancelled: self.queries_cancelled.load(Ordering::Relaxed),
            next_pages: self.next_pages.load(Ordering::Relaxed),
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            tokens_resumed: self.tokens_resumed.load(Ordering::Relaxed),
            tokens_rejected: self.tokens_rejected.load(Ordering::Relaxed),
            tokens_evicted: self.tokens_evicted.load(Ordering::Relaxed),
            filter_clauses_dropped: self.filter_clauses_dropped.load(Ordering::Relaxed),
            filter_arguments_ignored: self.filter_arguments_ignored.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_cancelled: u64,
    pub next_pages: u64,
    pub tokens_issued: u64,
    pub tokens_resumed: u64,
    pub tokens_rejected: u64,
    pub tokens_evicted: u64,
    pub filter_clauses_dropped: u64,
    pub filter_arguments_ignored: u64,
}
