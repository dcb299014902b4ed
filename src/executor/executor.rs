//! Query executor
//!
//! Runs a `ResourceQuery` against a record source.
//!
//! Execution flow (strict order):
//! 1. Compile the filter against the record schema
//! 2. Under `Prefer: return=minimal`, check for any row and stop
//! 3. Fetch sorted rows, one more than the page size
//! 4. Drop the extra row and issue a next link when present
//! 5. Count matching rows when requested or for delta queries
//! 6. Issue a delta link when no next page exists
//!
//! Projection is applied afterwards, on the materialized page.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value as Json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::envelope::{Many, One, Page};
use super::errors::{ExecutorError, ExecutorResult};
use super::source::{InMemorySource, RecordSource, SourceRequest};
use crate::config::CrudOptions;
use crate::filter::{compile, CompareOp, Predicate};
use crate::observability::{Event, MetricsRegistry};
use crate::projection::Shape;
use crate::query::{QueryParams, ResourceQuery};
use crate::schema::{resolve, Record, Schema, Value};
use crate::sort::SortPlan;
use crate::token::{build_link, generator_for, parse_link, ContinuationTokenGenerator, LinkKind};

/// Query compiled against one schema
struct CompiledQuery {
    filter: Option<Predicate>,
    sort: SortPlan,
    skip: usize,
    /// `None` when the query carries no paging window
    page_size: Option<usize>,
}

impl CompiledQuery {
    fn request<'a>(&'a self, query: &ResourceQuery, fetch_one_extra: bool) -> SourceRequest<'a> {
        SourceRequest {
            filter: self.filter.as_ref(),
            sort: &self.sort,
            skip: self.skip,
            take: self
                .page_size
                .map(|size| if fetch_one_extra { size + 1 } else { size }),
            as_of: query.as_of,
        }
    }
}

/// Executes queries and issues continuation links
pub struct QueryExecutor {
    options: CrudOptions,
    tokens: Arc<dyn ContinuationTokenGenerator>,
    metrics: Arc<MetricsRegistry>,
}

impl QueryExecutor {
    /// Creates an executor using the token strategy named in `options`
    pub fn new(options: CrudOptions) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let tokens = generator_for(&options, Arc::clone(&metrics));
        Self {
            options,
            tokens,
            metrics,
        }
    }

    /// Creates an executor with an explicit token generator
    pub fn with_generator(
        options: CrudOptions,
        tokens: Arc<dyn ContinuationTokenGenerator>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            options,
            tokens,
            metrics,
        }
    }

    pub fn options(&self) -> &CrudOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn tokens(&self) -> &Arc<dyn ContinuationTokenGenerator> {
        &self.tokens
    }

    fn compile(&self, schema: &'static Schema, query: &ResourceQuery) -> CompiledQuery {
        let compiled = compile(schema, &query.filter);
        if compiled.dropped_clauses > 0 {
            self.metrics
                .add_filter_clauses_dropped(compiled.dropped_clauses as u64);
        }
        let ignored = compiled.ignored_groups + compiled.ignored_arguments;
        if ignored > 0 {
            self.metrics.add_filter_arguments_ignored(ignored as u64);
        }

        let paging = query.paging;
        CompiledQuery {
            filter: compiled.predicate,
            sort: SortPlan::compile(schema, &query.sorting),
            skip: paging.map_or(0, |p| p.effective_offset()),
            page_size: paging.map(|p| p.effective_size(self.options.default_page_size)),
        }
    }

    /// Parses query-string parameters for `T`
    pub fn parse_query<T: Record>(&self, params: &QueryParams) -> ResourceQuery {
        ResourceQuery::parse::<T>(params, &self.options)
    }

    /// Applies filter, sort and paging to rows already in memory
    pub fn apply<T: Record>(&self, records: Vec<T>, query: &ResourceQuery, fetch_one_extra: bool) -> Vec<T> {
        let compiled = self.compile(T::descriptor(), query);
        InMemorySource::new(records).run(compiled.request(query, fetch_one_extra))
    }

    async fn guarded<R>(
        &self,
        cancel: &CancellationToken,
        operation: impl Future<Output = ExecutorResult<R>>,
    ) -> ExecutorResult<R> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
            result = operation => result,
        };
        if let Err(ExecutorError::Cancelled) = &result {
            self.metrics.increment_queries_cancelled();
            debug!(event = %Event::QueryCancelled);
        }
        result
    }

    fn issue_link(&self, schema: &Schema, query: &ResourceQuery, kind: LinkKind) -> ExecutorResult<String> {
        let token = self.tokens.build(schema, query)?;
        self.metrics.increment_tokens_issued();
        debug!(event = %Event::TokenIssued, schema = schema.name(), kind = %kind);
        Ok(build_link(query.server_uri.as_deref(), kind, &token))
    }

    fn set_delta_link(&self, schema: &Schema, query: &mut ResourceQuery) -> ExecutorResult<()> {
        let link = self.issue_link(schema, query, LinkKind::Delta)?;
        debug!(event = %Event::DeltaLinkIssued, schema = schema.name(), link = link.as_str());
        query.delta_link = Some(link);
        Ok(())
    }

    /// Runs `query` and returns the page rows plus the total count.
    ///
    /// Sets `next_link` / `delta_link` on `query`. Under
    /// `Prefer: return=minimal` the rows are `Some(empty)` when something
    /// matched and `None` otherwise.
    pub async fn get<T, S>(
        &self,
        source: &S,
        query: &mut ResourceQuery,
        cancel: &CancellationToken,
    ) -> ExecutorResult<(Option<Vec<T>>, Option<usize>)>
    where
        T: Record,
        S: RecordSource<T>,
    {
        let schema = T::descriptor();
        let compiled = self.compile(schema, query);
        let minimal_count = query.count_total_rows.then_some(0);

        if query.prefer_minimal {
            let any = self
                .guarded(cancel, source.any(compiled.filter.as_ref(), cancel))
                .await?;
            self.metrics.increment_queries_executed();
            debug!(event = %Event::QueryExecuted, schema = schema.name(), minimal = true, any);
            return Ok((any.then(Vec::new), minimal_count));
        }

        let mut rows = self
            .guarded(cancel, source.fetch(compiled.request(query, true), cancel))
            .await?;

        let mut has_next = false;
        if let Some(size) = compiled.page_size {
            if rows.len() > size {
                rows.truncate(size);
                has_next = true;

                let link = self.issue_link(schema, query, LinkKind::Next)?;
                debug!(event = %Event::NextLinkIssued, schema = schema.name(), link = link.as_str());
                query.next_link = Some(link);
                self.metrics.increment_next_pages();
            }
        }

        let mut count = None;
        if query.count_total_rows || query.is_delta_query {
            let total = self
                .guarded(cancel, source.count(compiled.filter.as_ref(), cancel))
                .await?;
            count = Some(total);
        }

        if query.is_delta_query && !has_next {
            self.set_delta_link(schema, query)?;
        }

        self.metrics.increment_queries_executed();
        debug!(
            event = %Event::QueryExecuted,
            schema = schema.name(),
            rows = rows.len(),
            has_next,
            count = ?count
        );
        Ok((Some(rows), count))
    }

    /// Runs `query` and wraps the result in a response envelope
    pub async fn to_many<T, S>(
        &self,
        source: &S,
        query: &mut ResourceQuery,
        cancel: &CancellationToken,
    ) -> ExecutorResult<Page<T>>
    where
        T: Record,
        S: RecordSource<T>,
    {
        let (value, count) = self.get(source, query, cancel).await?;
        let many = Many::new(value, query.next_link.clone(), query.delta_link.clone());
        Ok(match count {
            Some(total) => Page::Counted(many.with_count(total)),
            None => Page::Many(many),
        })
    }

    /// Looks up one row by its key field.
    ///
    /// Returns the row and whether it was found. Under
    /// `Prefer: return=minimal` the row is withheld.
    pub async fn get_by_id<T, S>(
        &self,
        source: &S,
        query: &ResourceQuery,
        id: Value,
        cancel: &CancellationToken,
    ) -> ExecutorResult<(Option<T>, bool)>
    where
        T: Record,
        S: RecordSource<T>,
    {
        let schema = T::descriptor();
        let Some(key) = resolve(schema, schema.key()) else {
            warn!(schema = schema.name(), key = schema.key(), "key field does not resolve");
            return Ok((None, false));
        };

        let filter = Predicate::compare(key, CompareOp::Eq, id);
        let sort = SortPlan::default();
        let request = SourceRequest {
            filter: Some(&filter),
            sort: &sort,
            skip: 0,
            take: Some(1),
            as_of: query.as_of,
        };
        let row = self
            .guarded(cancel, source.fetch(request, cancel))
            .await?
            .into_iter()
            .next();

        self.metrics.increment_queries_executed();
        let found = row.is_some();
        debug!(event = %Event::QueryExecuted, schema = schema.name(), lookup = true, found);

        Ok(if query.prefer_minimal { (None, found) } else { (row, found) })
    }

    /// Looks up one row by key and wraps it in a `One` envelope
    pub async fn to_one<T, S>(
        &self,
        source: &S,
        query: &ResourceQuery,
        id: Value,
        cancel: &CancellationToken,
    ) -> ExecutorResult<One<T>>
    where
        T: Record,
        S: RecordSource<T>,
    {
        Ok(match self.get_by_id(source, query, id, cancel).await? {
            (Some(row), _) => One::found(row),
            (None, true) => One::found_minimal(),
            (None, false) => One::missing(),
        })
    }

    /// Restores a query from a next link, delta link or bare token.
    ///
    /// Next links and bare tokens advance the page offset by the page size
    /// (or the server default). Delta links keep the window and replay it
    /// from the recorded as-of time.
    pub fn resume<T: Record>(&self, link_or_token: &str) -> Option<ResourceQuery> {
        let schema = T::descriptor();
        let (kind, token) = parse_link(link_or_token);
        if token.is_empty() {
            return None;
        }

        let Some(mut query) = self.tokens.parse(schema, token) else {
            self.metrics.increment_tokens_rejected();
            return None;
        };

        if kind != Some(LinkKind::Delta) {
            if let Some(paging) = query.paging.as_mut() {
                let size = paging.page_size.unwrap_or(self.options.default_page_size);
                paging.page_offset = Some(paging.page_offset.unwrap_or(0).saturating_add(size));
            }
        }

        self.metrics.increment_tokens_resumed();
        debug!(
            event = %Event::TokenResumed,
            schema = schema.name(),
            kind = kind.map_or("token", |k| k.segment()),
            offset = ?query.paging.and_then(|p| p.page_offset)
        );
        Some(query)
    }

    /// Reshapes every row of a page with the query's projection
    pub fn shape_page<T: Record>(&self, page: Page<T>, query: &ResourceQuery) -> ExecutorResult<Page<Json>> {
        let shape = Shape::from_paths(&query.projection);
        Ok(page.try_map(|row| shape.apply(&row))?)
    }

    /// Reshapes a single-item result with the query's projection
    pub fn shape_one<T: Record>(&self, one: One<T>, query: &ResourceQuery) -> ExecutorResult<One<Json>> {
        let shape = Shape::from_paths(&query.projection);
        Ok(one.try_map(|row| shape.apply(&row))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::WeatherForecast;
    use crate::query::Paging;

    fn executor(page_size: i32) -> QueryExecutor {
        QueryExecutor::new(CrudOptions::with_page_size(page_size))
    }

    fn params(query: &str) -> QueryParams {
        QueryParams::parse(query)
    }

    #[test]
    fn test_apply_in_memory() {
        let executor = executor(10);
        let rows = WeatherForecast::generate(30, 3);
        let query = executor.parse_query::<WeatherForecast>(&params("$orderBy=temperatureC desc&$top=5"));

        let page = executor.apply(rows.clone(), &query, false);
        assert_eq!(page.len(), 5);
        assert!(page.windows(2).all(|w| w[0].temperature_c >= w[1].temperature_c));
        assert_eq!(executor.apply(rows, &query, true).len(), 6);
    }

    #[tokio::test]
    async fn test_get_issues_next_link() {
        let executor = executor(10);
        let source = InMemorySource::new(WeatherForecast::generate(25, 1));
        let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
        query.server_uri = Some("https://api.example.com/forecasts".into());

        let (rows, count) = executor.get(&source, &mut query, &CancellationToken::new()).await.unwrap();
        assert_eq!(rows.unwrap().len(), 10);
        assert_eq!(count, None);
        let next = query.next_link.unwrap();
        assert!(next.starts_with("https://api.example.com/forecasts/nextLink/"));
        assert_eq!(executor.metrics().snapshot().next_pages, 1);
    }

    #[tokio::test]
    async fn test_resume_advances_offset() {
        let executor = executor(10);
        let source = InMemorySource::new(WeatherForecast::generate(25, 1));
        let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
        executor.get(&source, &mut query, &CancellationToken::new()).await.unwrap();

        let resumed = executor
            .resume::<WeatherForecast>(query.next_link.as_deref().unwrap())
            .unwrap();
        assert_eq!(
            resumed.paging,
            Some(Paging {
                page_offset: Some(10),
                page_size: Some(10),
                max_page_size: None,
            })
        );
        assert!(executor.resume::<WeatherForecast>("/nextLink/garbage!").is_none());
        assert_eq!(executor.metrics().snapshot().tokens_rejected, 1);
    }

    #[tokio::test]
    async fn test_prefer_minimal_checks_existence_only() {
        let executor = executor(10);
        let source = InMemorySource::new(WeatherForecast::generate(5, 1));
        let mut query = executor.parse_query::<WeatherForecast>(&params("$count=true"));
        query.apply_prefer(["return=minimal"]);

        let (rows, count) = executor.get(&source, &mut query, &CancellationToken::new()).await.unwrap();
        assert_eq!(rows, Some(Vec::new()));
        assert_eq!(count, Some(0));

        let mut none = executor.parse_query::<WeatherForecast>(&params("$filter=temperatureC gt 1000"));
        none.apply_prefer(["return=minimal"]);
        let (rows, count) = executor.get(&source, &mut none, &CancellationToken::new()).await.unwrap();
        assert_eq!(rows, None);
        assert_eq!(count, None);
    }

    #[tokio::test]
    async fn test_cancellation_surfaces() {
        let executor = executor(10);
        let source = InMemorySource::new(WeatherForecast::generate(5, 1));
        let mut query = executor.parse_query::<WeatherForecast>(&QueryParams::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = executor.get(&source, &mut query, &cancel).await.unwrap_err();
        assert_eq!(err, ExecutorError::Cancelled);
        assert_eq!(executor.metrics().snapshot().queries_cancelled, 1);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let executor = executor(10);
        let rows = WeatherForecast::generate(5, 9);
        let wanted = rows[3].clone();
        let source = InMemorySource::new(rows);
        let query = ResourceQuery::new();
        let cancel = CancellationToken::new();

        let one = executor
            .to_one(&source, &query, Value::Uuid(wanted.id), &cancel)
            .await
            .unwrap();
        assert_eq!(one.value, Some(wanted.clone()));

        let missing = executor
            .to_one(&source, &query, Value::Uuid(uuid::Uuid::nil()), &cancel)
            .await
            .unwrap();
        assert!(!missing.found);

        let mut minimal = ResourceQuery::new();
        minimal.prefer_minimal = true;
        let one = executor
            .to_one(&source, &minimal, Value::Uuid(wanted.id), &cancel)
            .await
            .unwrap();
        assert!(one.found);
        assert_eq!(one.value, None);
    }

    #[tokio::test]
    async fn test_shape_page_applies_projection() {
        let executor = executor(10);
        let source = InMemorySource::new(WeatherForecast::generate(3, 1));
        let mut query = executor.parse_query::<WeatherForecast>(&params("$select=date"));

        let page = executor.to_many(&source, &mut query, &CancellationToken::new()).await.unwrap();
        let shaped = executor.shape_page(page, &query).unwrap();
        let json = serde_json::to_value(&shaped).unwrap();

        let first = &json["value"][0];
        assert_eq!(first.as_object().unwrap().len(), 1);
        assert!(first.get("date").is_some());
        assert_eq!(json["items"], 3);
    }
}
