//! CLI command implementations
//!
//! Every command runs against a generated `WeatherForecast` collection
//! and prints one JSON line per result on stdout.

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::CrudOptions;
use crate::demo::WeatherForecast;
use crate::executor::{InMemorySource, QueryExecutor};
use crate::query::{QueryParams, ResourceQuery};
use crate::token::{parse_link, PortableTokenGenerator};

use super::args::{Cli, Command, QueryArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments, installs logging and dispatches to the command.
/// This is the only function that main.rs should call.
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    crate::observability::init_logging(&cli.log);

    let result = run_command(cli.command).await;
    if let Err(e) = &result {
        write_error(e.code_str(), e.message())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Query(args) => query(&args).await,
        Command::Follow { query, max_pages } => follow(&query, max_pages).await,
        Command::InspectToken { token } => inspect_token(&token),
    }
}

/// Loads options and applies command-line overrides
pub fn resolve_options(args: &QueryArgs) -> CliResult<CrudOptions> {
    let mut options = match &args.config {
        Some(path) => CrudOptions::from_json_file(path)?,
        None => CrudOptions::default(),
    };
    if let Some(size) = args.page_size {
        options.default_page_size = size;
    }
    if let Some(strategy) = args.strategy {
        options.token_strategy = strategy.into();
    }
    options.validate()?;
    Ok(options)
}

fn build_query(executor: &QueryExecutor, args: &QueryArgs) -> ResourceQuery {
    let params = QueryParams::parse(&args.params);
    let mut query = executor.parse_query::<WeatherForecast>(&params);
    if args.prefer_minimal {
        query.apply_prefer(["return=minimal"]);
    }
    query.is_delta_query = args.delta;
    query.server_uri = args.server_uri.clone();
    query
}

/// Run one query and print the reshaped page
pub async fn query(args: &QueryArgs) -> CliResult<()> {
    let executor = QueryExecutor::new(resolve_options(args)?);
    let source = InMemorySource::new(WeatherForecast::generate(args.rows, args.seed));
    let mut query = build_query(&executor, args);

    let page = executor
        .to_many(&source, &mut query, &CancellationToken::new())
        .await?;
    let shaped = executor.shape_page(page, &query)?;

    write_response(&json!({
        "preferenceApplied": query.preference_applied(),
        "page": shaped,
    }))
}

/// Run a query and keep resuming its next link until the last page
pub async fn follow(args: &QueryArgs, max_pages: usize) -> CliResult<()> {
    let executor = QueryExecutor::new(resolve_options(args)?);
    let source = InMemorySource::new(WeatherForecast::generate(args.rows, args.seed));
    let cancel = CancellationToken::new();

    let mut query = build_query(&executor, args);
    let mut pages = 0;
    let mut rows = 0;

    loop {
        let page = executor.to_many(&source, &mut query, &cancel).await?;
        let next = page.next_link().map(str::to_string);
        let shaped = executor.shape_page(page, &query)?;

        pages += 1;
        rows += shaped.items();
        write_response(&json!({ "page": pages, "result": shaped }))?;

        let Some(link) = next else { break };
        if pages >= max_pages {
            info!(pages, "page limit reached");
            break;
        }
        query = executor
            .resume::<WeatherForecast>(&link)
            .ok_or_else(CliError::invalid_token)?;
    }

    write_response(&json!({
        "pages": pages,
        "rows": rows,
        "metrics": executor.metrics().snapshot(),
    }))
}

/// Decode a portable token and print its contents
pub fn inspect_token(token: &str) -> CliResult<()> {
    let (_, token) = parse_link(token);
    let contents = PortableTokenGenerator::new()
        .inspect(token)
        .ok_or_else(CliError::invalid_token)?;
    write_response(&contents)
}
