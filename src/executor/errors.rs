//! Executor errors
//!
//! Error codes:
//! - QUERY_CANCELLED
//! - QUERY_SOURCE_FAILED
//! - CURSOR_* (from the cursor codec)
//! - SHAPE_UNKNOWN_FIELD (configuration)

use thiserror::Error;

use crate::cursor::CursorError;
use crate::projection::ShapeError;

/// Result type for query execution
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors raised while executing a query
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    /// Caller cancelled during fetch or count
    #[error("Query cancelled")]
    Cancelled,

    /// The record source failed to materialize rows
    #[error("Record source failed: {0}")]
    Source(String),

    /// A continuation token could not be built
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// Projection does not fit the record shape
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl ExecutorError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::Cancelled => "QUERY_CANCELLED",
            ExecutorError::Source(_) => "QUERY_SOURCE_FAILED",
            ExecutorError::Cursor(e) => e.code(),
            ExecutorError::Shape(_) => "SHAPE_UNKNOWN_FIELD",
        }
    }

    /// True for errors that point at server configuration rather than
    /// the request
    pub fn is_configuration(&self) -> bool {
        matches!(self, ExecutorError::Shape(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_classification() {
        assert_eq!(ExecutorError::Cancelled.code(), "QUERY_CANCELLED");
        assert!(!ExecutorError::Cancelled.is_configuration());

        let shape = ExecutorError::from(ShapeError::UnknownField {
            schema: "demo::WeatherForecast".into(),
            field: "wind".into(),
        });
        assert!(shape.is_configuration());

        let cursor = ExecutorError::from(CursorError::TooLarge(1));
        assert_eq!(cursor.code(), "CURSOR_TOO_LARGE");
    }
}
