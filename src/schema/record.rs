//! Record descriptors and field access
//!
//! A `Schema` describes one record type: its identity, its key field and
//! its fields in declaration order. Records expose their values through
//! the object-safe `Fields` trait so that nested records and sequences can
//! be walked without knowing their concrete types.

use super::types::{FieldKind, Value};

/// Descriptor of one field on a record type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    writable: bool,
}

impl FieldDescriptor {
    /// Canonical field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field shape
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the field is settable (computed fields are not)
    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

/// Complete description of a record type
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    key: String,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Starts building a schema with the given fully-qualified type name
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            key: None,
            fields: Vec::new(),
        }
    }

    /// Fully-qualified type identity
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the unique key field
    pub fn key(&self) -> &str {
        &self.key
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name, ignoring ASCII case
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Top-level fields that can be written
    pub fn writable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.writable)
    }
}

/// Builder for `Schema`
pub struct SchemaBuilder {
    name: String,
    key: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    /// Sets the unique key field. Defaults to `id`.
    pub fn key(mut self, field: impl Into<String>) -> Self {
        self.key = Some(field.into());
        self
    }

    /// Adds a writable field
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
            writable: true,
        });
        self
    }

    /// Adds a computed, read-only field
    pub fn computed(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
            writable: false,
        });
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            name: self.name,
            key: self.key.unwrap_or_else(|| "id".to_string()),
            fields: self.fields,
        }
    }
}

/// A value read from a record field
pub enum FieldValue<'a> {
    Scalar(Value),
    Record(Option<&'a dyn Fields>),
    Sequence(Vec<&'a dyn Fields>),
}

/// Dynamic field access on a record instance.
///
/// `field` is called with canonical names taken from the schema.
pub trait Fields: Send + Sync {
    /// Schema of this record type
    fn schema(&self) -> &'static Schema;

    /// Reads a field by canonical name
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// A record type that queries can run against
pub trait Record: Fields + Clone + Send + Sync + 'static {
    /// Schema shared by every instance of the type
    fn descriptor() -> &'static Schema;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;

    #[test]
    fn test_case_insensitive_field_lookup() {
        let schema = Schema::builder("tests::Probe")
            .field("temperatureC", FieldKind::Scalar(ScalarType::Int))
            .computed("temperatureF", FieldKind::Scalar(ScalarType::Int))
            .build();

        assert_eq!(schema.field("TEMPERATUREC").map(|f| f.name()), Some("temperatureC"));
        assert!(schema.field("missing").is_none());
        assert_eq!(schema.key(), "id");
        assert_eq!(schema.writable_fields().count(), 1);
    }
}
