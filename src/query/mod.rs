//! Query intake
//!
//! Normalizes query-string parameters into a `ResourceQuery`:
//!
//! 1. projection (`$select`, `$include`, `$exclude`)
//! 2. filter (`$filter`, kept raw until execution)
//! 3. sorting (`$orderBy` plus the key tie-break)
//! 4. paging (`$maxpagesize`, `$skip`, `$top`)
//! 5. count (`$count`)
//!
//! Operator names come from `CrudOptions`.

mod model;
mod paging;
mod params;

pub use model::{
    FieldIdentity, Paging, ProjectionPath, ResourceQuery, SearchTerm, SortDirection, SortEntry,
};
pub use paging::normalize as normalize_paging;
pub use params::QueryParams;

use tracing::debug;

use crate::config::CrudOptions;
use crate::observability::Event;
use crate::projection::apply_projection;
use crate::schema::{Record, Schema};
use crate::sort::apply_sorting;

const PREFER_MINIMAL: &str = "return=minimal";
const PREFER_REPRESENTATION: &str = "return=representation";

impl ResourceQuery {
    /// Parses parameters for record type `T`
    pub fn parse<T: Record>(params: &QueryParams, options: &CrudOptions) -> Self {
        Self::parse_for(T::descriptor(), params, options)
    }

    /// Parses parameters against an explicit schema
    pub fn parse_for(schema: &'static Schema, params: &QueryParams, options: &CrudOptions) -> Self {
        let mut query = ResourceQuery::new();
        query.apply_params(schema, params, options);
        query
    }

    /// Applies every query-string concern onto this query
    pub fn apply_params(&mut self, schema: &'static Schema, params: &QueryParams, options: &CrudOptions) {
        apply_projection(
            self,
            schema,
            &params.get_all(&options.include_operator),
            &params.get_all(&options.select_operator),
            &params.get_all(&options.exclude_operator),
        );
        self.apply_filter(params, options);
        apply_sorting(self, schema, &params.get_all(&options.order_by_operator));
        self.apply_paging(params, options);
        self.apply_count(params, options);

        debug!(
            event = %Event::QueryParsed,
            schema = schema.name(),
            filters = self.filter.len(),
            sort_keys = self.sorting.len(),
            projected = self.projection.len(),
            count = self.count_total_rows
        );
    }

    /// Stores raw `$filter` arguments
    pub fn apply_filter(&mut self, params: &QueryParams, options: &CrudOptions) {
        let clauses = params.get_all(&options.filter_operator);
        if clauses.is_empty() {
            return;
        }
        self.filter = clauses.into_iter().map(str::to_string).collect();
    }

    /// Normalizes the paging window
    pub fn apply_paging(&mut self, params: &QueryParams, options: &CrudOptions) {
        self.paging = Some(normalize_paging(
            self.paging,
            &params.get_all(&options.max_page_size_operator),
            &params.get_all(&options.skip_operator),
            &params.get_all(&options.top_operator),
            options.default_page_size,
        ));
    }

    /// Sets `count_total_rows` for `true`, `yes` or `1`
    pub fn apply_count(&mut self, params: &QueryParams, options: &CrudOptions) {
        let requested = params
            .get_all(&options.count_operator)
            .into_iter()
            .map(str::trim)
            .any(|v| {
                v.eq_ignore_ascii_case("true")
                    || v.eq_ignore_ascii_case("yes")
                    || v.parse::<i64>().ok() == Some(1)
            });
        if requested {
            self.count_total_rows = true;
        }
    }

    /// Applies `Prefer` header values; `return=minimal` sets `prefer_minimal`
    pub fn apply_prefer<'a>(&mut self, values: impl IntoIterator<Item = &'a str>) {
        let minimal = values
            .into_iter()
            .flat_map(|v| v.split(','))
            .any(|v| v.trim().eq_ignore_ascii_case(PREFER_MINIMAL));
        if minimal {
            self.prefer_minimal = true;
        }
    }

    /// `Preference-Applied` value to echo back
    pub fn preference_applied(&self) -> &'static str {
        if self.prefer_minimal {
            PREFER_MINIMAL
        } else {
            PREFER_REPRESENTATION
        }
    }
}
