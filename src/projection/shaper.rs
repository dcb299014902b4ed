//! Record reshaping
//!
//! Builds a JSON object per record holding only the projected paths.
//! Paths sharing a root are merged into one tree; requesting a root whole
//! wins over partial sub-paths.

use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::query::ProjectionPath;
use crate::schema::{FieldValue, Fields};

/// Result type for reshaping
pub type ShapeResult<T> = Result<T, ShapeError>;

/// Reshaping errors
///
/// These indicate a projection built for a different record type, which is
/// a configuration error rather than bad client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// Projected field missing from the record type
    #[error("Projected field '{field}' is not defined on {schema}")]
    UnknownField { schema: String, field: String },
}

/// Merged projection tree
#[derive(Debug, Clone, Default)]
pub struct Shape {
    /// Child name, with `None` meaning the whole field
    children: Vec<(String, Option<Shape>)>,
}

impl Shape {
    /// Merges projection paths into one tree
    pub fn from_paths(paths: &[ProjectionPath]) -> Self {
        let mut shape = Shape::default();
        for path in paths {
            shape.insert(path);
        }
        shape
    }

    /// Returns true when nothing is projected
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn insert(&mut self, path: &ProjectionPath) {
        let Some(name) = path.name.as_deref() else {
            return;
        };
        let position = self
            .children
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name));

        match (position, path.next.as_deref()) {
            (Some(i), None) => self.children[i].1 = None,
            (Some(i), Some(next)) => {
                if let Some(child) = self.children[i].1.as_mut() {
                    child.insert(next);
                }
            }
            (None, None) => self.children.push((name.to_string(), None)),
            (None, Some(next)) => {
                let mut child = Shape::default();
                child.insert(next);
                self.children.push((name.to_string(), Some(child)));
            }
        }
    }

    /// Reshapes one record; an empty shape yields the full record
    pub fn apply(&self, record: &dyn Fields) -> ShapeResult<Json> {
        if self.is_empty() {
            return Ok(full(record));
        }
        self.apply_node(record).map(Json::Object)
    }

    fn apply_node(&self, record: &dyn Fields) -> ShapeResult<Map<String, Json>> {
        let schema = record.schema();
        let mut object = Map::new();

        for (name, sub) in &self.children {
            let field = schema.field(name).ok_or_else(|| ShapeError::UnknownField {
                schema: schema.name().to_string(),
                field: name.clone(),
            })?;

            let value = match (record.field(field.name()), sub) {
                (Some(FieldValue::Scalar(v)), _) => v.to_json(),
                (Some(FieldValue::Record(None)), _) | (None, _) => Json::Null,
                (Some(FieldValue::Record(Some(inner))), None) => full(inner),
                (Some(FieldValue::Record(Some(inner))), Some(shape)) => {
                    Json::Object(shape.apply_node(inner)?)
                }
                (Some(FieldValue::Sequence(items)), None) => {
                    Json::Array(items.into_iter().map(full).collect())
                }
                (Some(FieldValue::Sequence(items)), Some(shape)) => Json::Array(
                    items
                        .into_iter()
                        .map(|item| shape.apply_node(item).map(Json::Object))
                        .collect::<ShapeResult<Vec<_>>>()?,
                ),
            };
            object.insert(field.name().to_string(), value);
        }

        Ok(object)
    }
}

/// Every field of a record, computed ones included
pub fn full(record: &dyn Fields) -> Json {
    let mut object = Map::new();
    for field in record.schema().fields() {
        let value = match record.field(field.name()) {
            Some(FieldValue::Scalar(v)) => v.to_json(),
            Some(FieldValue::Record(Some(inner))) => full(inner),
            Some(FieldValue::Sequence(items)) => Json::Array(items.into_iter().map(full).collect()),
            Some(FieldValue::Record(None)) | None => Json::Null,
        };
        object.insert(field.name().to_string(), value);
    }
    Json::Object(object)
}

/// Reshapes one record with the given projection
pub fn shape(record: &dyn Fields, paths: &[ProjectionPath]) -> ShapeResult<Json> {
    Shape::from_paths(paths).apply(record)
}
