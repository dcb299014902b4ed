//! Observability subsystem
//!
//! This module provides:
//! - Structured logging through `tracing`, one typed `Event` per line
//! - Lock-free counters for execution and token traffic
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on query results
//! 3. Library code only emits; the binary installs the subscriber
//!
//! # Usage
//!
//! ```ignore
//! use collection_query::observability::{Event, MetricsRegistry};
//!
//! tracing::debug!(event = %Event::TokenIssued, schema = "demo::WeatherForecast");
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_executed();
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use tracing_subscriber::EnvFilter;

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`.
///
/// `default_directive` applies when `RUST_LOG` is unset. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
