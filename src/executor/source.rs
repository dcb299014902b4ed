//! Record sources
//!
//! The executor compiles a query into a `SourceRequest`; a source
//! materializes it. Fetch, count and any are the only suspension points
//! and the only calls that see the caller's cancellation token.

use std::future::{self, Future};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tokio_util::sync::CancellationToken;

use super::errors::{ExecutorError, ExecutorResult};
use crate::filter::Predicate;
use crate::schema::Record;
use crate::sort::SortPlan;

/// A compiled page request
#[derive(Debug, Clone, Copy)]
pub struct SourceRequest<'a> {
    /// Row predicate; `None` keeps every row
    pub filter: Option<&'a Predicate>,
    pub sort: &'a SortPlan,
    pub skip: usize,
    /// Row limit; `None` is unbounded
    pub take: Option<usize>,
    /// Snapshot time requested by a delta query
    pub as_of: Option<DateTime<FixedOffset>>,
}

/// Backing store the executor reads from
pub trait RecordSource<T>: Send + Sync {
    /// Filtered, sorted, windowed rows
    fn fetch(
        &self,
        request: SourceRequest<'_>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ExecutorResult<Vec<T>>> + Send;

    /// Number of rows matching `filter`, ignoring paging
    fn count(
        &self,
        filter: Option<&Predicate>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ExecutorResult<usize>> + Send;

    /// Whether any row matches `filter`
    fn any(
        &self,
        filter: Option<&Predicate>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send;
}

/// Rows held in memory. Cloning shares the rows.
///
/// Keeps no history, so `as_of` is ignored.
#[derive(Debug)]
pub struct InMemorySource<T> {
    records: Arc<Vec<T>>,
}

impl<T> Clone for InMemorySource<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<T: Record> InMemorySource<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    pub fn from_shared(records: Arc<Vec<T>>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matching<'a>(&'a self, filter: Option<&'a Predicate>) -> impl Iterator<Item = &'a T> + 'a {
        self.records
            .iter()
            .filter(move |record| filter.map_or(true, |p| p.evaluate(*record)))
    }

    /// Runs a request synchronously
    pub fn run(&self, request: SourceRequest<'_>) -> Vec<T> {
        let matched: Vec<T> = self.matching(request.filter).cloned().collect();
        let sorted = request.sort.sort(matched).into_iter().skip(request.skip);
        match request.take {
            Some(take) => sorted.take(take).collect(),
            None => sorted.collect(),
        }
    }
}

fn check(cancel: &CancellationToken) -> ExecutorResult<()> {
    if cancel.is_cancelled() {
        Err(ExecutorError::Cancelled)
    } else {
        Ok(())
    }
}

impl<T: Record> RecordSource<T> for InMemorySource<T> {
    fn fetch(
        &self,
        request: SourceRequest<'_>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ExecutorResult<Vec<T>>> + Send {
        future::ready(check(cancel).map(|()| self.run(request)))
    }

    fn count(
        &self,
        filter: Option<&Predicate>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ExecutorResult<usize>> + Send {
        future::ready(check(cancel).map(|()| self.matching(filter).count()))
    }

    fn any(
        &self,
        filter: Option<&Predicate>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ExecutorResult<bool>> + Send {
        future::ready(check(cancel).map(|()| self.matching(filter).next().is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::WeatherForecast;
    use crate::filter::compile;
    use crate::query::{SortDirection, SortEntry, FieldIdentity};

    fn source() -> InMemorySource<WeatherForecast> {
        InMemorySource::new(WeatherForecast::generate(30, 11))
    }

    #[tokio::test]
    async fn test_fetch_windows_sorted_rows() {
        let source = source();
        let schema = WeatherForecast::descriptor();
        let sort = SortPlan::compile(
            schema,
            &[SortEntry {
                field: Some(FieldIdentity {
                    declaring_type: Some(schema.name().to_string()),
                    name: Some("date".into()),
                }),
                path: "date".into(),
                direction: SortDirection::Desc,
            }],
        );
        let request = SourceRequest {
            filter: None,
            sort: &sort,
            skip: 5,
            take: Some(3),
            as_of: None,
        };

        let rows = source.fetch(request, &CancellationToken::new()).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.windows(2).all(|w| w[0].date > w[1].date));
    }

    #[tokio::test]
    async fn test_count_and_any_respect_filter() {
        let source = source();
        let schema = WeatherForecast::descriptor();
        let compiled = compile(schema, &["temperatureC gt 1000".to_string()]);
        let cancel = CancellationToken::new();

        assert_eq!(source.count(compiled.predicate.as_ref(), &cancel).await.unwrap(), 0);
        assert!(!source.any(compiled.predicate.as_ref(), &cancel).await.unwrap());
        assert_eq!(source.count(None, &cancel).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(source().count(None, &cancel).await, Err(ExecutorError::Cancelled));
    }
}
