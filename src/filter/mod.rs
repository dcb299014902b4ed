//! Filter compiler subsystem
//!
//! Turns `$filter` arguments such as `date ge 2024-01-01 and not summary eq 'Hot'`
//! into a `Predicate` evaluated per record.
//!
//! Grammar:
//! - comparison: `<field> <eq|ne|gt|ge|lt|le> <literal>`
//! - connectives: `and`, `or`, `not`, no precedence, left to right
//! - grouping with parentheses
//! - literals: bare words or single/double quoted text
//!
//! The compiler is fail-open: input it cannot understand widens the result
//! rather than producing an error.

mod ast;
mod compiler;
mod tokenizer;

pub use ast::{CompareOp, Operand, Predicate};
pub use compiler::{compile, CompiledFilter};
pub use tokenizer::{tokenize, Token};
