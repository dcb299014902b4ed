//! Field resolver subsystem
//!
//! Record types describe themselves with a static `Schema`. Every other
//! subsystem (filter, sort, projection) addresses record fields only through
//! resolved `FieldPath`s, never by reflection over concrete types.
//!
//! # Design Principles
//!
//! - Case-insensitive resolution, canonical names afterwards
//! - Unresolvable paths are absence, not errors
//! - Schemas are built once per type and shared

mod record;
mod resolver;
mod types;

pub use record::{FieldDescriptor, FieldValue, Fields, Record, Schema, SchemaBuilder};
pub use resolver::{resolve, FieldPath, PathSegment};
pub use types::{FieldKind, ScalarType, Value};
