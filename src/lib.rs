//! collection-query - query-string driven filtering, sorting, projection
//! and paging over typed record collections
//!
//! - `schema`: static field descriptors for record types
//! - `query`: `$filter`, `$orderBy`, `$select`, paging and `Prefer` parsing
//! - `filter`, `sort`, `projection`: compile query parts against a schema
//! - `cursor`: binary query codec used by continuation tokens
//! - `token`: portable and cached continuation-token strategies
//! - `executor`: runs queries against a `RecordSource` and builds envelopes

pub mod cli;
pub mod config;
pub mod cursor;
pub mod demo;
pub mod executor;
pub mod filter;
pub mod observability;
pub mod projection;
pub mod query;
pub mod schema;
pub mod sort;
pub mod token;
