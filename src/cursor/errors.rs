//! Cursor codec errors
//!
//! Error codes:
//! - CURSOR_TRUNCATED
//! - CURSOR_TOO_LARGE
//! - CURSOR_MALFORMED

use thiserror::Error;

/// Result type for cursor encoding and decoding
pub type CursorResult<T> = Result<T, CursorError>;

/// Errors raised while encoding or decoding a cursor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// Buffer ended before a value was complete
    #[error("Cursor truncated: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// String bytes are not UTF-8
    #[error("Cursor string at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),

    /// Length prefix or count is negative or overflows
    #[error("Invalid length {length} at offset {offset}")]
    InvalidLength { offset: usize, length: i64 },

    /// Sort direction tag outside 0..=1
    #[error("Unknown sort direction tag {0}")]
    InvalidDirection(u8),

    /// Timestamp ticks or offset outside the representable range
    #[error("Invalid timestamp: ticks {ticks}, offset ticks {offset_ticks}")]
    InvalidTimestamp { ticks: i64, offset_ticks: i64 },

    /// Value too large for the wire format
    #[error("Value of {0} bytes is too large to encode")]
    TooLarge(usize),
}

impl CursorError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CursorError::UnexpectedEof { .. } => "CURSOR_TRUNCATED",
            CursorError::TooLarge(_) => "CURSOR_TOO_LARGE",
            _ => "CURSOR_MALFORMED",
        }
    }
}
