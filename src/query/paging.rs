//! Paging normalization
//!
//! Turns the raw `$maxpagesize`, `$skip` and `$top` values into a `Paging`
//! window. A parameter only counts when it is given exactly once and parses
//! as an integer.
//!
//! Rules:
//! - `$maxpagesize` defaults to the server page size and is only lowered
//! - `$skip` sets the offset; negative offsets clamp to zero
//! - `$top` sets the page size, clamped to the server page size
//! - without `$top`, page size is `min(maxpagesize, default)`

use super::model::Paging;

fn single_int(values: &[&str]) -> Option<i32> {
    match values {
        [one] => one.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Normalizes a paging window onto `existing` (or a fresh one).
///
/// A `$top` or `$maxpagesize` of zero or less is treated like an
/// unparseable value: the server page size applies. A zero-row page would
/// issue a next link that never advances the offset.
pub fn normalize(
    existing: Option<Paging>,
    max_page_size: &[&str],
    skip: &[&str],
    top: &[&str],
    default_page_size: i32,
) -> Paging {
    let mut paging = existing.unwrap_or_default();

    if !max_page_size.is_empty() {
        let requested = single_int(max_page_size).filter(|n| *n > 0);
        paging.max_page_size = Some(match requested {
            Some(n) if n < default_page_size => n,
            _ => default_page_size,
        });
    }

    if !skip.is_empty() {
        if let Some(offset) = single_int(skip) {
            paging.page_offset = Some(offset.max(0));
        }
    }

    if !top.is_empty() {
        let size = single_int(top)
            .filter(|n| *n > 0)
            .unwrap_or(default_page_size);
        paging.page_size = Some(size.min(default_page_size));
    }

    if paging.page_offset.is_none() {
        paging.page_offset = Some(0);
    }

    if paging.page_size.is_none() {
        paging.page_size = Some(match paging.max_page_size {
            Some(max) if max < default_page_size => max,
            _ => default_page_size,
        });
    }

    paging
}
