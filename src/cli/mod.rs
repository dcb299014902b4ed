//! CLI module for collection-query
//!
//! Provides command-line interface for:
//! - query: Run one query against a generated collection
//! - follow: Run a query and walk every next link
//! - inspect-token: Decode a portable continuation token

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs, StrategyArg};
pub use commands::{follow, inspect_token, query, resolve_options, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
