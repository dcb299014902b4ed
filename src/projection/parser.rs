//! Projection parsing
//!
//! `$select` lists exactly the fields to return. `$include` adds fields to
//! the writable top-level set. `$exclude` removes fields from it; a dotted
//! exclusion keeps the parent but drops the named child.

use tracing::debug;

use crate::observability::Event;
use crate::query::{ProjectionPath, ResourceQuery};
use crate::schema::{resolve, FieldPath, Schema};

fn clauses<'a>(values: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

fn push_unique(paths: &mut Vec<ProjectionPath>, path: &FieldPath) {
    let dotted = path.dotted();
    if !paths.iter().any(|p| p.dotted().eq_ignore_ascii_case(&dotted)) {
        paths.push(ProjectionPath::from_field_path(path));
    }
}

fn resolve_clause(schema: &'static Schema, clause: &str) -> Option<FieldPath> {
    let resolved = resolve(schema, clause);
    if resolved.is_none() {
        debug!(
            event = %Event::ProjectionPathSkipped,
            schema = schema.name(),
            clause
        );
    }
    resolved
}

/// Fills `query.projection` from the three projection parameters.
///
/// `select` takes precedence over `include`, which takes precedence over
/// `exclude`. No parameter leaves the projection empty (full records).
pub fn apply_projection(
    query: &mut ResourceQuery,
    schema: &'static Schema,
    include: &[&str],
    select: &[&str],
    exclude: &[&str],
) {
    let paths = &mut query.projection;

    if !select.is_empty() {
        for clause in clauses(select) {
            if let Some(path) = resolve_clause(schema, clause) {
                push_unique(paths, &path);
            }
        }
    } else if !include.is_empty() {
        for field in schema.writable_fields() {
            if let Some(path) = resolve(schema, field.name()) {
                push_unique(paths, &path);
            }
        }
        for clause in clauses(include) {
            if let Some(path) = resolve_clause(schema, clause) {
                push_unique(paths, &path);
            }
        }
    } else if !exclude.is_empty() {
        let exclusions: Vec<String> = clauses(exclude)
            .filter_map(|clause| resolve_clause(schema, clause))
            .map(|path| path.dotted().to_ascii_lowercase())
            .collect();

        let mut kept = Vec::new();
        collect_remaining(schema, "", &exclusions, &mut kept);

        for dotted in kept {
            if let Some(path) = resolve(schema, &dotted) {
                push_unique(paths, &path);
            }
        }
    }
}

/// Writable fields of `schema` under `prefix`, minus `exclusions`.
///
/// A field with an excluded descendant is expanded into its own writable
/// children instead of being kept whole.
fn collect_remaining(schema: &'static Schema, prefix: &str, exclusions: &[String], out: &mut Vec<String>) {
    for field in schema.writable_fields() {
        let dotted = if prefix.is_empty() {
            field.name().to_string()
        } else {
            format!("{}.{}", prefix, field.name())
        };
        let lower = dotted.to_ascii_lowercase();

        if exclusions.iter().any(|e| *e == lower) {
            continue;
        }

        let child_prefix = format!("{}.", lower);
        let has_excluded_child = exclusions.iter().any(|e| e.starts_with(&child_prefix));

        match field.kind().nested() {
            Some(child) if has_excluded_child => {
                collect_remaining(child, &dotted, exclusions, out)
            }
            _ => out.push(dotted),
        }
    }
}
