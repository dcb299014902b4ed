//! Projection subsystem
//!
//! Parses `$select` / `$include` / `$exclude` into projection paths and
//! reshapes materialized records into JSON objects carrying only those
//! paths.

mod parser;
mod shaper;

pub use parser::apply_projection;
pub use shaper::{full, shape, Shape, ShapeError, ShapeResult};
