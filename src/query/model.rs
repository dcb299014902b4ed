//! Normalized query model
//!
//! `ResourceQuery` is the single intermediate representation shared by the
//! executor, the cursor codec and the token generators.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::schema::FieldPath;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `ASC` or `DESC`, ignoring case
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    /// Wire tag
    pub fn as_byte(&self) -> u8 {
        match self {
            SortDirection::Asc => 0,
            SortDirection::Desc => 1,
        }
    }

    /// Decodes a wire tag
    pub fn from_byte(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SortDirection::Asc),
            1 => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Identity of a sortable field: declaring record type and field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIdentity {
    pub declaring_type: Option<String>,
    pub name: Option<String>,
}

impl FieldIdentity {
    /// Identity of the leaf field of a resolved path
    pub fn of_leaf(path: &FieldPath) -> Self {
        let leaf = path.leaf();
        Self {
            declaring_type: Some(leaf.schema.name().to_string()),
            name: Some(leaf.field.name().to_string()),
        }
    }
}

/// One sort key: field identity, dotted path and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortEntry {
    /// `None` when the field could not be identified
    pub field: Option<FieldIdentity>,
    pub path: String,
    pub direction: SortDirection,
}

/// Singly linked projection chain, one node per path segment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProjectionPath {
    /// Type identity of the field at this hop
    pub type_name: Option<String>,
    pub name: Option<String>,
    pub next: Option<Box<ProjectionPath>>,
}

impl ProjectionPath {
    /// Builds a projection chain from a resolved field path
    pub fn from_field_path(path: &FieldPath) -> Self {
        let mut chain: Option<Box<ProjectionPath>> = None;
        for segment in path.segments().iter().rev() {
            chain = Some(Box::new(ProjectionPath {
                type_name: Some(segment.field.kind().type_identity()),
                name: Some(segment.field.name().to_string()),
                next: chain,
            }));
        }
        chain.map(|b| *b).unwrap_or_default()
    }

    /// Dotted form of the chain; unnamed nodes end it
    pub fn dotted(&self) -> String {
        let mut names = Vec::new();
        let mut node = Some(self);
        while let Some(current) = node {
            match &current.name {
                Some(name) => names.push(name.as_str()),
                None => break,
            }
            node = current.next.as_deref();
        }
        names.join(".")
    }
}

/// Free-text search term, carried but not evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTerm {
    pub column: String,
    pub predicate: String,
}

/// Paging window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Paging {
    pub page_offset: Option<i32>,
    pub page_size: Option<i32>,
    pub max_page_size: Option<i32>,
}

impl Paging {
    /// Effective page size, falling back to `default_page_size`
    pub fn effective_size(&self, default_page_size: i32) -> usize {
        self.page_size.unwrap_or(default_page_size).max(0) as usize
    }

    /// Effective row offset
    pub fn effective_offset(&self) -> usize {
        self.page_offset.unwrap_or(0).max(0) as usize
    }
}

/// A parsed, normalized collection query
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResourceQuery {
    /// Raw filter arguments; compiled against a schema at execution
    pub filter: Vec<String>,
    pub sorting: Vec<SortEntry>,
    pub projection: Vec<ProjectionPath>,
    pub search: Vec<SearchTerm>,
    pub paging: Option<Paging>,
    pub count_total_rows: bool,
    pub prefer_minimal: bool,
    pub is_delta_query: bool,
    pub as_of: Option<DateTime<FixedOffset>>,
    pub server_uri: Option<String>,
    pub next_link: Option<String>,
    pub delta_link: Option<String>,
}

impl ResourceQuery {
    /// Creates an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any filter argument is present
    pub fn has_filter(&self) -> bool {
        self.filter.iter().any(|f| !f.trim().is_empty())
    }

    /// Adds a free-text search term
    pub fn add_search(&mut self, column: impl Into<String>, predicate: impl Into<String>) {
        self.search.push(SearchTerm {
            column: column.into(),
            predicate: predicate.into(),
        });
    }

    /// Whether a sort entry already addresses `path` (ignoring ASCII case)
    pub fn is_sorted_by(&self, path: &str) -> bool {
        self.sorting
            .iter()
            .any(|s| s.path.eq_ignore_ascii_case(path))
    }
}
