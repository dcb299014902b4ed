//! Query Executor subsystem
//!
//! Applies a `ResourceQuery` to a record source and produces a response
//! envelope with continuation links.
//!
//! # Execution Flow (strict order)
//!
//! 1. Filter
//! 2. Sort (user keys, then the key tie-break)
//! 3. Page (skip, take one extra to detect a next page)
//! 4. Count, when requested or for delta queries
//! 5. Reshape the materialized page with the projection
//!
//! # Cancellation
//!
//! Only fetch, count and any observe the caller's cancellation token.

mod envelope;
mod errors;
mod executor;
mod source;

pub use envelope::{CountMany, Many, One, Page};
pub use errors::{ExecutorError, ExecutorResult};
pub use executor::QueryExecutor;
pub use source::{InMemorySource, RecordSource, SourceRequest};
