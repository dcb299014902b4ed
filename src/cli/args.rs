//! CLI argument definitions using clap
//!
//! Commands:
//! - collection-query query --params <query-string>
//! - collection-query follow --params <query-string>
//! - collection-query inspect-token <token>

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::TokenStrategy;

/// Query a generated weather-forecast collection with `$filter`, `$orderBy`,
/// `$select` and paging parameters
#[derive(Parser, Debug)]
#[command(name = "collection-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Dataset and option overrides shared by the query commands
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Query string, e.g. "$filter=temperatureC gt 10&$orderBy=date desc"
    #[arg(long, short, default_value = "")]
    pub params: String,

    /// Number of generated rows
    #[arg(long, default_value_t = 50)]
    pub rows: usize,

    /// Seed for the generated rows
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Path to a JSON options file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides the server page size
    #[arg(long)]
    pub page_size: Option<i32>,

    /// Overrides the continuation-token strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Base URI prefixed to next and delta links
    #[arg(long)]
    pub server_uri: Option<String>,

    /// Sends `Prefer: return=minimal`
    #[arg(long)]
    pub prefer_minimal: bool,

    /// Marks the query as a delta query
    #[arg(long)]
    pub delta: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Portable,
    Cached,
}

impl From<StrategyArg> for TokenStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Portable => TokenStrategy::Portable,
            StrategyArg::Cached => TokenStrategy::Cached,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one query and print the page
    Query(QueryArgs),

    /// Run a query and follow every next link to the end
    Follow {
        #[command(flatten)]
        query: QueryArgs,

        /// Stop after this many pages
        #[arg(long, default_value_t = 1000)]
        max_pages: usize,
    },

    /// Decode a portable continuation token
    InspectToken {
        /// Token, or a link ending in /nextLink/<token>
        token: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
