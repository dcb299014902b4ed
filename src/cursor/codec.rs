//! Binary query codec
//!
//! Field order:
//! 1. projections: i32 count, then per path a chain of
//!    (nullable type, nullable name, has-next bool) nodes
//! 2. filter: nullable string
//! 3. sorting: i32 count, then per entry a has-field bool followed, when
//!    set, by nullable declaring type, nullable field name, path string and
//!    direction byte (0 = asc, 1 = desc)
//! 4. paging: presence bool, then nullable i32 offset, size, max size
//! 5. search: i32 count, then nullable column and nullable predicate
//! 6. count-total-rows bool, delta-query bool
//! 7. as-of: nullable timestamp
//! 8. server URI: nullable string
//!
//! Decoding drops sort entries without identity, blank search terms and a
//! blank server URI.

use super::errors::{CursorError, CursorResult};
use super::wire::{WireReader, WireWriter};
use crate::query::{FieldIdentity, Paging, ProjectionPath, ResourceQuery, SearchTerm, SortDirection, SortEntry};

/// Encodes and decodes a `ResourceQuery`
pub trait QuerySerializer: Send + Sync {
    /// Writes `query` to `writer`
    fn serialize(&self, query: &ResourceQuery, writer: &mut WireWriter) -> CursorResult<()>;

    /// Reads a query from `reader`
    fn deserialize(&self, reader: &mut WireReader<'_>) -> CursorResult<ResourceQuery>;

    /// Encodes `query` into a fresh buffer
    fn encode(&self, query: &ResourceQuery) -> CursorResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        self.serialize(query, &mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Decodes a query from a complete buffer
    fn decode(&self, bytes: &[u8]) -> CursorResult<ResourceQuery> {
        self.deserialize(&mut WireReader::new(bytes))
    }
}

/// The binary cursor format
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryQueryCodec;

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn leading_joiner(argument: &str) -> (&'static str, &str) {
    let mut parts = argument.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim_start();
    if head.eq_ignore_ascii_case("or") && !rest.is_empty() {
        ("or", rest)
    } else if head.eq_ignore_ascii_case("and") && !rest.is_empty() {
        ("and", rest)
    } else {
        ("and", argument)
    }
}

/// Balances the parentheses of one filter argument.
///
/// Stray closing parentheses become spaces and unclosed groups are closed
/// at the end. Quoted literals are copied untouched. The argument compiles
/// to the same predicate either way.
fn balanced(argument: &str) -> String {
    let mut out = String::with_capacity(argument.len());
    let mut depth = 0usize;
    let mut rest = argument;

    while let Some(c) = rest.chars().next() {
        let len = c.len_utf8();
        if c == '\'' || c == '"' {
            let literal = rest[len..].find(c).map_or(len, |end| end + 2 * len);
            out.push_str(&rest[..literal]);
            rest = &rest[literal..];
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => {
                out.push(' ');
                rest = &rest[len..];
                continue;
            }
            ')' => depth -= 1,
            _ => {}
        }
        out.push(c);
        rest = &rest[len..];
    }

    out.extend(std::iter::repeat(')').take(depth));
    out
}

/// Joins filter arguments into the single string carried on the wire.
///
/// One argument is kept verbatim. Several are balanced, parenthesized and
/// joined with each argument's leading connective, `and` by default, which
/// keeps the compiled meaning unchanged.
pub fn join_filter(arguments: &[String]) -> Option<String> {
    let arguments: Vec<&str> = arguments
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    match arguments.as_slice() {
        [] => None,
        [single] => Some(single.to_string()),
        [first, rest @ ..] => {
            let mut joined = format!("({})", balanced(first));
            for argument in rest {
                let (joiner, body) = leading_joiner(argument);
                joined.push_str(&format!(" {} ({})", joiner, balanced(body)));
            }
            Some(joined)
        }
    }
}

impl BinaryQueryCodec {
    fn write_projections(&self, query: &ResourceQuery, w: &mut WireWriter) -> CursorResult<()> {
        w.write_count(query.projection.len())?;
        for path in &query.projection {
            let mut node = Some(path);
            while let Some(current) = node {
                w.write_nullable_string(current.type_name.as_deref())?;
                w.write_nullable_string(current.name.as_deref())?;
                node = current.next.as_deref();
                w.write_bool(node.is_some());
            }
        }
        Ok(())
    }

    fn read_projection(&self, r: &mut WireReader<'_>) -> CursorResult<ProjectionPath> {
        let mut nodes = Vec::new();
        loop {
            let type_name = r.read_nullable_string()?;
            let name = r.read_nullable_string()?;
            let has_next = r.read_bool()?;
            nodes.push(ProjectionPath {
                type_name,
                name,
                next: None,
            });
            if !has_next {
                break;
            }
        }

        let mut chain: Option<Box<ProjectionPath>> = None;
        while let Some(mut node) = nodes.pop() {
            node.next = chain;
            chain = Some(Box::new(node));
        }
        Ok(chain.map(|b| *b).unwrap_or_default())
    }

    fn write_sorting(&self, query: &ResourceQuery, w: &mut WireWriter) -> CursorResult<()> {
        w.write_count(query.sorting.len())?;
        for entry in &query.sorting {
            let Some(field) = &entry.field else {
                w.write_bool(false);
                continue;
            };
            w.write_bool(true);
            w.write_nullable_string(field.declaring_type.as_deref())?;
            w.write_nullable_string(field.name.as_deref())?;
            w.write_string(&entry.path)?;
            w.write_u8(entry.direction.as_byte());
        }
        Ok(())
    }

    fn read_sorting(&self, r: &mut WireReader<'_>, query: &mut ResourceQuery) -> CursorResult<()> {
        for _ in 0..r.read_count()? {
            if !r.read_bool()? {
                continue;
            }
            let declaring_type = r.read_nullable_string()?;
            let name = r.read_nullable_string()?;
            let path = r.read_string()?;
            let tag = r.read_u8()?;
            let direction = SortDirection::from_byte(tag).ok_or(CursorError::InvalidDirection(tag))?;

            if is_blank(&declaring_type) || is_blank(&name) {
                continue;
            }
            query.sorting.push(SortEntry {
                field: Some(FieldIdentity {
                    declaring_type,
                    name,
                }),
                path,
                direction,
            });
        }
        Ok(())
    }

    fn write_paging(&self, query: &ResourceQuery, w: &mut WireWriter) {
        if let Some(paging) = &query.paging {
            w.write_bool(true);
            w.write_nullable_i32(paging.page_offset);
            w.write_nullable_i32(paging.page_size);
            w.write_nullable_i32(paging.max_page_size);
        } else {
            w.write_bool(false);
        }
    }

    fn read_paging(&self, r: &mut WireReader<'_>) -> CursorResult<Option<Paging>> {
        if !r.read_bool()? {
            return Ok(None);
        }
        Ok(Some(Paging {
            page_offset: r.read_nullable_i32()?,
            page_size: r.read_nullable_i32()?,
            max_page_size: r.read_nullable_i32()?,
        }))
    }

    fn write_search(&self, query: &ResourceQuery, w: &mut WireWriter) -> CursorResult<()> {
        w.write_count(query.search.len())?;
        for term in &query.search {
            w.write_nullable_string(Some(&term.column))?;
            w.write_nullable_string(Some(&term.predicate))?;
        }
        Ok(())
    }

    fn read_search(&self, r: &mut WireReader<'_>, query: &mut ResourceQuery) -> CursorResult<()> {
        for _ in 0..r.read_count()? {
            let column = r.read_nullable_string()?;
            let predicate = r.read_nullable_string()?;
            if let (Some(column), Some(predicate)) = (column, predicate) {
                if !column.trim().is_empty() && !predicate.trim().is_empty() {
                    query.search.push(SearchTerm { column, predicate });
                }
            }
        }
        Ok(())
    }
}

impl QuerySerializer for BinaryQueryCodec {
    fn serialize(&self, query: &ResourceQuery, w: &mut WireWriter) -> CursorResult<()> {
        self.write_projections(query, w)?;
        w.write_nullable_string(join_filter(&query.filter).as_deref())?;
        self.write_sorting(query, w)?;
        self.write_paging(query, w);
        self.write_search(query, w)?;

        w.write_bool(query.count_total_rows);
        w.write_bool(query.is_delta_query);
        w.write_nullable_timestamp(query.as_of.as_ref());
        w.write_nullable_string(query.server_uri.as_deref())?;
        Ok(())
    }

    fn deserialize(&self, r: &mut WireReader<'_>) -> CursorResult<ResourceQuery> {
        let mut query = ResourceQuery::new();

        for _ in 0..r.read_count()? {
            let path = self.read_projection(r)?;
            query.projection.push(path);
        }
        query.filter = r.read_nullable_string()?.into_iter().collect();
        self.read_sorting(r, &mut query)?;
        query.paging = self.read_paging(r)?;
        self.read_search(r, &mut query)?;

        query.count_total_rows = r.read_bool()?;
        query.is_delta_query = r.read_bool()?;
        query.as_of = r.read_nullable_timestamp()?;
        query.server_uri = r
            .read_nullable_string()?
            .filter(|uri| !uri.trim().is_empty());

        Ok(query)
    }
}
