//! Composite record ordering
//!
//! Sorts records by a list of keys, lexicographically, honoring each key's
//! direction. Sort is stable; equal keys keep source order.

use std::cmp::Ordering;

use crate::query::{SortDirection, SortEntry};
use crate::schema::{resolve, FieldPath, Fields, Schema, Value};

/// Sort keys resolved against one schema
#[derive(Debug, Clone, Default)]
pub struct SortPlan {
    keys: Vec<(FieldPath, SortDirection)>,
}

impl SortPlan {
    /// Resolves sort entries against `schema`.
    ///
    /// Entries without a field identity, whose identity names a different
    /// declaring type, or that no longer resolve to a scalar are skipped.
    pub fn compile(schema: &'static Schema, entries: &[SortEntry]) -> Self {
        let keys = entries
            .iter()
            .filter_map(|entry| {
                let identity = entry.field.as_ref()?;
                let path = resolve(schema, &entry.path)?;
                path.scalar_type()?;
                let leaf = path.leaf();
                let same_type = identity.declaring_type.as_deref() == Some(leaf.schema.name());
                let same_field = identity
                    .name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(leaf.field.name()));
                (same_type && same_field).then_some((path, entry.direction))
            })
            .collect();
        Self { keys }
    }

    /// Returns true when there is nothing to sort by
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of resolved keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    fn key_of(&self, record: &dyn Fields) -> Vec<Value> {
        self.keys.iter().map(|(path, _)| path.read(record)).collect()
    }

    fn compare_keys(&self, a: &[Value], b: &[Value]) -> Ordering {
        for ((_, direction), (x, y)) in self.keys.iter().zip(a.iter().zip(b.iter())) {
            let ordering = x.sort_cmp(y);
            let ordering = match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Compares two records
    pub fn compare(&self, a: &dyn Fields, b: &dyn Fields) -> Ordering {
        self.compare_keys(&self.key_of(a), &self.key_of(b))
    }

    /// Sorts records, reading each key once per record
    pub fn sort<T: Fields>(&self, records: Vec<T>) -> Vec<T> {
        if self.keys.is_empty() {
            return records;
        }
        let mut keyed: Vec<(Vec<Value>, T)> = records
            .into_iter()
            .map(|r| (self.key_of(&r), r))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| self.compare_keys(a, b));
        keyed.into_iter().map(|(_, r)| r).collect()
    }
}
