//! Sorting subsystem
//!
//! Parses `$orderBy` into sort entries, guarantees a key tie-break, and
//! orders records by the resolved keys.

mod comparator;
mod parser;

pub use comparator::SortPlan;
pub use parser::{apply_default_sort, apply_sorting, sort};
