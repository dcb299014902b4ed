//! Paging protocol tests
//!
//! Walks next links end to end and checks page sizes, counts, delta links
//! and `Prefer: return=minimal` against the in-memory source.

mod common;

use std::collections::HashSet;

use collection_query::config::{CrudOptions, TokenStrategy};
use collection_query::demo::WeatherForecast;
use collection_query::executor::{InMemorySource, Page, QueryExecutor};
use collection_query::query::{QueryParams, ResourceQuery};
use tokio_util::sync::CancellationToken;

use common::{executor, forecasts};

async fn run(
    executor: &QueryExecutor,
    source: &InMemorySource<WeatherForecast>,
    query: &mut ResourceQuery,
) -> Page<WeatherForecast> {
    executor
        .to_many(source, query, &CancellationToken::new())
        .await
        .unwrap()
}

/// Follows next links to the end, returning the page sizes and every row
async fn traverse(
    executor: &QueryExecutor,
    source: &InMemorySource<WeatherForecast>,
    params: &str,
) -> (Vec<usize>, Vec<WeatherForecast>) {
    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::parse(params));
    let mut sizes = Vec::new();
    let mut rows = Vec::new();

    loop {
        let page = run(executor, source, &mut query).await;
        sizes.push(page.items());
        let next = page.next_link().map(str::to_string);
        rows.extend(page.into_value().unwrap());

        match next {
            Some(link) => query = executor.resume::<WeatherForecast>(&link).unwrap(),
            None => break,
        }
        assert!(sizes.len() <= 100, "traversal does not terminate");
    }
    (sizes, rows)
}

#[tokio::test]
async fn test_default_page_size_traversal() {
    let executor = executor(10);
    let source = forecasts(35);

    let (sizes, rows) = traverse(&executor, &source, "").await;

    assert_eq!(sizes, vec![10, 10, 10, 5]);
    let ids: HashSet<_> = rows.iter().map(|f| f.id).collect();
    assert_eq!(ids.len(), 35);
}

#[tokio::test]
async fn test_exact_multiple_has_no_trailing_empty_page() {
    let executor = executor(10);
    let (sizes, _) = traverse(&executor, &forecasts(20), "").await;
    assert_eq!(sizes, vec![10, 10]);
}

#[tokio::test]
async fn test_traversal_keeps_filter_and_order() {
    let executor = executor(4);
    let source = forecasts(40);

    let (_, rows) = traverse(
        &executor,
        &source,
        "$filter=temperatureC ge 0&$orderBy=temperatureC desc",
    )
    .await;

    let expected = WeatherForecast::generate(40, 42)
        .into_iter()
        .filter(|f| f.temperature_c >= 0)
        .count();
    assert_eq!(rows.len(), expected);
    assert!(rows.iter().all(|f| f.temperature_c >= 0));
    assert!(rows.windows(2).all(|w| w[0].temperature_c >= w[1].temperature_c));
}

#[tokio::test]
async fn test_max_page_size_lowers_page() {
    let executor = executor(100);
    let source = forecasts(120);

    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::parse("$maxpagesize=50"));
    let page = run(&executor, &source, &mut query).await;
    assert_eq!(page.items(), 50);
    assert!(page.next_link().is_some());

    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::parse("$maxpagesize=500"));
    let page = run(&executor, &source, &mut query).await;
    assert_eq!(page.items(), 100);
}

#[tokio::test]
async fn test_top_clamped_to_server_page_size() {
    let executor = executor(10);
    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::parse("$top=20"));
    let page = run(&executor, &forecasts(30), &mut query).await;
    assert_eq!(page.items(), 10);
}

#[tokio::test]
async fn test_skip_offsets_first_page() {
    let executor = executor(10);
    let source = forecasts(30);

    let mut all = executor.parse_query::<WeatherForecast>(&QueryParams::parse("$top=10"));
    let first = run(&executor, &source, &mut all).await.into_value().unwrap();

    let mut skipped = executor.parse_query::<WeatherForecast>(&QueryParams::parse("$skip=5&$top=5"));
    let page = run(&executor, &source, &mut skipped).await.into_value().unwrap();
    assert_eq!(page, first[5..10].to_vec());
}

#[tokio::test]
async fn test_count_reports_total() {
    let executor = executor(25);
    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::parse("$count=true"));
    let page = run(&executor, &forecasts(50), &mut query).await;

    assert_eq!(page.items(), 25);
    assert_eq!(page.max_items(), Some(50));

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["items"], 25);
    assert_eq!(json["maxItems"], 50);
    assert!(json["@nextLink"].is_string());
}

#[tokio::test]
async fn test_count_not_requested_is_plain_page() {
    let executor = executor(25);
    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
    let page = run(&executor, &forecasts(5), &mut query).await;

    assert!(matches!(page, Page::Many(_)));
    let json = serde_json::to_value(&page).unwrap();
    assert!(json.get("maxItems").is_none());
    assert!(json.get("@nextLink").is_none());
}

#[tokio::test]
async fn test_prefer_minimal() {
    let executor = executor(10);
    let source = forecasts(30);

    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::parse("$count=true"));
    query.apply_prefer(["return=minimal"]);
    let page = run(&executor, &source, &mut query).await;
    assert_eq!(page.value(), Some(&[][..]));
    assert_eq!(page.max_items(), Some(0));
    assert!(page.next_link().is_none());

    let mut query =
        executor.parse_query::<WeatherForecast>(&QueryParams::parse("$filter=temperatureC gt 1000"));
    query.apply_prefer(["odata.maxpagesize=5, return=minimal"]);
    let page = run(&executor, &source, &mut query).await;
    assert_eq!(page.value(), None);
}

#[tokio::test]
async fn test_delta_link_on_last_page() {
    let executor = executor(10);
    let source = forecasts(5);

    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
    query.is_delta_query = true;
    query.server_uri = Some("https://h/forecasts".into());
    let page = run(&executor, &source, &mut query).await;

    assert!(page.next_link().is_none());
    let delta = page.delta_link().unwrap().to_string();
    assert!(delta.starts_with("https://h/forecasts/deltaLink/"));

    let replay = executor.resume::<WeatherForecast>(&delta).unwrap();
    assert!(replay.is_delta_query);
    assert!(replay.as_of.is_some());
    assert_eq!(replay.paging.and_then(|p| p.page_offset), Some(0));
}

#[tokio::test]
async fn test_delta_traversal_ends_with_delta_link() {
    let executor = executor(10);
    let source = forecasts(25);

    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
    query.is_delta_query = true;
    let mut pages = Vec::new();

    loop {
        let page = run(&executor, &source, &mut query).await;
        pages.push((
            page.items(),
            page.next_link().is_some(),
            page.delta_link().is_some(),
        ));
        match page.next_link() {
            Some(link) => query = executor.resume::<WeatherForecast>(link).unwrap(),
            None => break,
        }
    }

    assert_eq!(
        pages,
        vec![(10, true, false), (10, true, false), (5, false, true)]
    );
}

#[tokio::test]
async fn test_next_link_carries_server_uri() {
    let executor = executor(10);
    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
    query.server_uri = Some("https://h/forecasts/".into());

    let page = run(&executor, &forecasts(15), &mut query).await;
    let link = page.next_link().unwrap();
    assert!(link.starts_with("https://h/forecasts/nextLink/"));

    let resumed = executor.resume::<WeatherForecast>(link).unwrap();
    assert_eq!(resumed.paging.and_then(|p| p.page_offset), Some(10));
    assert_eq!(resumed.server_uri.as_deref(), Some("https://h/forecasts/"));
}

#[tokio::test]
async fn test_cached_strategy_traversal() {
    let mut options = CrudOptions::with_page_size(10);
    options.token_strategy = TokenStrategy::Cached;
    let executor = QueryExecutor::new(options);

    let (sizes, rows) = traverse(&executor, &forecasts(25), "$orderBy=date desc").await;

    assert_eq!(sizes, vec![10, 10, 5]);
    assert!(rows.windows(2).all(|w| w[0].date > w[1].date));

    let metrics = executor.metrics().snapshot();
    assert_eq!(metrics.tokens_issued, 2);
    assert_eq!(metrics.tokens_resumed, 2);
}

#[tokio::test]
async fn test_cached_tokens_are_short() {
    let mut options = CrudOptions::with_page_size(10);
    options.token_strategy = TokenStrategy::Cached;
    let executor = QueryExecutor::new(options);

    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::parse(
        "$filter=temperatureC gt -100 and summary ne 'x'&$orderBy=date desc,temperatureC",
    ));
    let page = run(&executor, &forecasts(30), &mut query).await;
    let link = page.next_link().unwrap();
    assert_eq!(link.len(), "/nextLink/".len() + 11);
}

#[tokio::test]
async fn test_tampered_link_rejected() {
    let executor = executor(10);
    let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
    let page = run(&executor, &forecasts(15), &mut query).await;

    let link = page.next_link().unwrap();
    let truncated = &link[..link.len() - 6];
    assert!(executor.resume::<WeatherForecast>(truncated).is_none());
    assert_eq!(executor.metrics().snapshot().tokens_rejected, 1);
}
