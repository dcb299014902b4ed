//! Cursor Codec
//!
//! Binary serialization of a `ResourceQuery`, the payload carried inside
//! continuation tokens.
//!
//! - `wire`: primitive readers and writers (ints, strings, timestamps)
//! - `codec`: the query layout built on top of them
//! - `errors`: decode failures with stable codes

mod codec;
mod errors;
mod wire;

pub use codec::{join_filter, BinaryQueryCodec, QuerySerializer};
pub use errors::{CursorError, CursorResult};
pub use wire::{from_ticks, to_ticks, WireReader, WireWriter};
