//! Dotted path resolution
//!
//! Resolves `a.b.c` against a record schema, one case-insensitive segment
//! at a time. Resolution fails (returns `None`) when a segment is unknown or
//! addresses a child beneath a scalar field.

use std::fmt;

use super::record::{FieldDescriptor, FieldValue, Fields, Schema};
use super::types::{ScalarType, Value};

/// One resolved hop: the field and the record type that declares it
#[derive(Clone, Copy)]
pub struct PathSegment {
    pub schema: &'static Schema,
    pub field: &'static FieldDescriptor,
}

/// A resolved, non-empty field path
#[derive(Clone)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

/// Resolves a dotted path against `schema`.
///
/// Segments are trimmed and empty segments are skipped.
pub fn resolve(schema: &'static Schema, dotted: &str) -> Option<FieldPath> {
    let mut segments = Vec::new();
    let mut current = Some(schema);

    for part in dotted.split('.').map(str::trim).filter(|p| !p.is_empty()) {
        let owner = current?;
        let field = owner.field(part)?;
        segments.push(PathSegment {
            schema: owner,
            field,
        });
        current = field.kind().nested();
    }

    if segments.is_empty() {
        None
    } else {
        Some(FieldPath { segments })
    }
}

impl FieldPath {
    /// Path segments from the root field to the leaf
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The root segment
    pub fn root(&self) -> PathSegment {
        self.segments[0]
    }

    /// The leaf segment
    pub fn leaf(&self) -> PathSegment {
        self.segments[self.segments.len() - 1]
    }

    /// Canonical dotted form, using declared field names
    pub fn dotted(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.field.name())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Scalar type of the leaf when the path can be read as a single value.
    ///
    /// Paths that cross a sequence, or end on a record, are not scalar.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        let crosses_sequence = self.segments.iter().any(|s| s.field.kind().is_sequence());
        if crosses_sequence {
            return None;
        }
        self.leaf().field.kind().scalar()
    }

    /// Reads the leaf value from `record`.
    ///
    /// An absent nested record along the way yields `Value::Null`.
    pub fn read<'a>(&self, record: &'a dyn Fields) -> Value {
        let mut current: &'a dyn Fields = record;
        let last = self.segments.len() - 1;

        for (i, segment) in self.segments.iter().enumerate() {
            match current.field(segment.field.name()) {
                Some(FieldValue::Scalar(value)) if i == last => return value,
                Some(FieldValue::Record(Some(next))) if i < last => current = next,
                _ => return Value::Null,
            }
        }
        Value::Null
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldPath({})", self.dotted())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;
    use std::sync::OnceLock;

    #[derive(Clone)]
    struct Inner {
        label: Option<String>,
    }

    #[derive(Clone)]
    struct Outer {
        count: i64,
        inner: Option<Inner>,
    }

    fn inner_schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("tests::Inner")
                .field("label", FieldKind::Nullable(ScalarType::Text))
                .build()
        })
    }

    fn outer_schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("tests::Outer")
                .field("count", FieldKind::Scalar(ScalarType::Int))
                .field("inner", FieldKind::Record(inner_schema))
                .build()
        })
    }

    impl Fields for Inner {
        fn schema(&self) -> &'static Schema {
            inner_schema()
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "label" => Some(FieldValue::Scalar(self.label.clone().into())),
                _ => None,
            }
        }
    }

    impl Fields for Outer {
        fn schema(&self) -> &'static Schema {
            outer_schema()
        }

        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "count" => Some(FieldValue::Scalar(Value::Int(self.count))),
                "inner" => Some(FieldValue::Record(
                    self.inner.as_ref().map(|i| i as &dyn Fields),
                )),
                _ => None,
            }
        }
    }

    #[test]
    fn test_resolve_nested_case_insensitive() {
        let path = resolve(outer_schema(), " Inner . LABEL ").unwrap();
        assert_eq!(path.dotted(), "inner.label");
        assert_eq!(path.leaf().schema.name(), "tests::Inner");
        assert_eq!(path.scalar_type(), Some(ScalarType::Text));
    }

    #[test]
    fn test_resolve_rejects_child_of_scalar() {
        assert!(resolve(outer_schema(), "count.value").is_none());
        assert!(resolve(outer_schema(), "nope").is_none());
        assert!(resolve(outer_schema(), " . ").is_none());
    }

    #[test]
    fn test_read_through_absent_record_is_null() {
        let path = resolve(outer_schema(), "inner.label").unwrap();
        let empty = Outer {
            count: 1,
            inner: None,
        };
        let full = Outer {
            count: 2,
            inner: Some(Inner {
                label: Some("x".into()),
            }),
        };
        assert_eq!(path.read(&empty), Value::Null);
        assert_eq!(path.read(&full), Value::Text("x".into()));
    }
}
