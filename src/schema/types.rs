//! Scalar value model
//!
//! Supported scalar types:
//! - bool: Boolean
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - text: UTF-8 string
//! - uuid: 128-bit identifier
//! - date: calendar date without time
//! - datetime: timestamp with UTC offset

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::record::Schema;

/// Scalar field types a filter or sort can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int,
    Float,
    Text,
    Uuid,
    Date,
    DateTime,
}

impl ScalarType {
    /// Returns the type name used in diagnostics and projection identities
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Text => "text",
            ScalarType::Uuid => "uuid",
            ScalarType::Date => "date",
            ScalarType::DateTime => "datetime",
        }
    }

    /// Converts a filter literal into a typed value.
    ///
    /// Parsing is culture-invariant. Returns `None` when the text is not a
    /// valid literal of this type.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match self {
            ScalarType::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            ScalarType::Int => raw.parse::<i64>().ok().map(Value::Int),
            ScalarType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
            ScalarType::Text => Some(Value::Text(raw.to_string())),
            ScalarType::Uuid => Uuid::parse_str(raw).ok().map(Value::Uuid),
            ScalarType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            ScalarType::DateTime => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(Value::DateTime),
        }
    }
}

/// Shape of a single field on a record
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// Non-nullable scalar
    Scalar(ScalarType),
    /// Scalar that may hold null
    Nullable(ScalarType),
    /// Nested record, possibly absent
    Record(fn() -> &'static Schema),
    /// Ordered collection of nested records
    Sequence(fn() -> &'static Schema),
}

impl FieldKind {
    /// Scalar type of this field, if it is a scalar
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            FieldKind::Scalar(t) | FieldKind::Nullable(t) => Some(*t),
            _ => None,
        }
    }

    /// Whether null is a legal value of this field
    pub fn is_nullable(&self) -> bool {
        matches!(self, FieldKind::Nullable(_) | FieldKind::Record(_))
    }

    /// Schema of the nested record type, for record and sequence fields
    pub fn nested(&self) -> Option<&'static Schema> {
        match self {
            FieldKind::Record(schema) | FieldKind::Sequence(schema) => Some(schema()),
            _ => None,
        }
    }

    /// Whether this field is a sequence of records
    pub fn is_sequence(&self) -> bool {
        matches!(self, FieldKind::Sequence(_))
    }

    /// Type identity written into projection paths.
    ///
    /// Scalars use their type name (`int`, `text?`), records their schema
    /// name, sequences the schema name in brackets.
    pub fn type_identity(&self) -> String {
        match self {
            FieldKind::Scalar(t) => t.type_name().to_string(),
            FieldKind::Nullable(t) => format!("{}?", t.type_name()),
            FieldKind::Record(schema) => schema().name().to_string(),
            FieldKind::Sequence(schema) => format!("[{}]", schema().name()),
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(t) => write!(f, "Scalar({:?})", t),
            FieldKind::Nullable(t) => write!(f, "Nullable({:?})", t),
            FieldKind::Record(schema) => write!(f, "Record({})", schema().name()),
            FieldKind::Sequence(schema) => write!(f, "Sequence({})", schema().name()),
        }
    }
}

/// A dynamically typed scalar read from a record or parsed from a literal
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl Value {
    /// Returns true for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Compares two non-null values of compatible types.
    ///
    /// Int and Float compare numerically. Returns `None` for null operands
    /// and for values of unrelated types.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality with nullable lifting: null equals null, null never
    /// equals a non-null value.
    pub fn lifted_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => self.partial_compare(other) == Some(Ordering::Equal),
        }
    }

    /// Total order used for sorting.
    ///
    /// Ordering rules:
    /// - null sorts first
    /// - same-kind values use their natural order
    /// - unrelated kinds fall back to a fixed kind rank
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        if let Some(ordering) = self.partial_compare(other) {
            return ordering;
        }
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Uuid(_) => 4,
            Value::Date(_) => 5,
            Value::DateTime(_) => 6,
        }
    }

    /// Converts to JSON for reshaped output
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map(Value::Text).unwrap_or(Value::Null)
    }
}

impl From<Option<i64>> for Value {
    fn from(value: Option<i64>) -> Self {
        value.map(Value::Int).unwrap_or(Value::Null)
    }
}
