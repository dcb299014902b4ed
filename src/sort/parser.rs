//! Order-by parsing
//!
//! Each `$orderBy` value holds clauses of the form `field [asc|desc]`,
//! separated by whitespace or commas. Text up to an `=` in the field token
//! is ignored.

use tracing::debug;

use crate::observability::Event;
use crate::query::{FieldIdentity, ResourceQuery, SortDirection, SortEntry};
use crate::schema::{resolve, FieldPath, Schema};

fn sortable(schema: &'static Schema, name: &str) -> Option<FieldPath> {
    resolve(schema, name).filter(|path| path.scalar_type().is_some())
}

fn entry(path: &FieldPath, direction: SortDirection) -> SortEntry {
    SortEntry {
        field: Some(FieldIdentity::of_leaf(path)),
        path: path.dotted(),
        direction,
    }
}

/// Replaces the query's sorting with `clauses` plus the default key sort
pub fn apply_sorting(query: &mut ResourceQuery, schema: &'static Schema, clauses: &[&str]) {
    query.sorting.clear();
    sort(query, schema, clauses);
    apply_default_sort(query, schema);
}

/// Splits order-by values into `(field, direction)` clauses.
///
/// Clauses are separated by commas or whitespace; a word that is not a
/// direction starts a new clause. A direction with no field before it, or
/// a second direction on one clause, is ignored.
fn clauses<'a>(values: &[&'a str]) -> Vec<(&'a str, SortDirection)> {
    let mut out: Vec<(&'a str, SortDirection)> = Vec::new();
    for chunk in values.iter().flat_map(|value| value.split(',')) {
        let mut directed = true;
        for word in chunk.split_whitespace() {
            match SortDirection::parse(word) {
                Some(direction) if !directed => {
                    if let Some(last) = out.last_mut() {
                        last.1 = direction;
                    }
                    directed = true;
                }
                Some(_) => {}
                None => {
                    out.push((word, SortDirection::Asc));
                    directed = false;
                }
            }
        }
    }
    out
}

/// Appends sort entries for every clause that resolves to a scalar field
pub fn sort(query: &mut ResourceQuery, schema: &'static Schema, values: &[&str]) {
    for (field, direction) in clauses(values) {
        let name = match field.find('=') {
            Some(at) => &field[at + 1..],
            None => field,
        };

        match sortable(schema, name) {
            Some(path) => query.sorting.push(entry(&path, direction)),
            None => debug!(
                event = %Event::SortKeySkipped,
                schema = schema.name(),
                clause = field
            ),
        }
    }
}

/// Appends an ascending sort on the schema key unless already sorted by it.
///
/// Paging depends on a total order; the key sort breaks every tie.
pub fn apply_default_sort(query: &mut ResourceQuery, schema: &'static Schema) {
    let Some(path) = sortable(schema, schema.key()) else {
        return;
    };
    if !query.is_sorted_by(&path.dotted()) {
        query.sorting.push(entry(&path, SortDirection::Asc));
    }
}
