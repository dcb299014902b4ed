//! Observable events
//!
//! Every structured log line carries one of these names in its `event`
//! field. Events are explicit and typed.

use std::fmt;

/// Observable events in query processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Intake
    /// Query string normalized into a query
    QueryParsed,

    // Filter compilation
    /// Filter tree built
    FilterCompiled,
    /// A comparison was dropped (unknown field or bad literal)
    FilterClauseDropped,
    /// A parenthesized group used an unsupported operator
    FilterGroupIgnored,
    /// A whole filter argument used an unsupported operator
    FilterArgumentIgnored,

    // Sorting and projection
    /// An order-by clause did not resolve
    SortKeySkipped,
    /// A projection path did not resolve
    ProjectionPathSkipped,

    // Execution
    /// Query executed against a source
    QueryExecuted,
    /// Query cancelled by the caller
    QueryCancelled,
    /// A next-page link was attached
    NextLinkIssued,
    /// A delta link was attached
    DeltaLinkIssued,

    // Continuation tokens
    /// Token built for a query
    TokenIssued,
    /// Token accepted and resumed
    TokenResumed,
    /// Token could not be parsed, was foreign, or expired
    TokenRejected,
    /// Cached token removed by expiry or capacity
    TokenEvicted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryParsed => "QUERY_PARSED",

            Event::FilterCompiled => "FILTER_COMPILED",
            Event::FilterClauseDropped => "FILTER_CLAUSE_DROPPED",
            Event::FilterGroupIgnored => "FILTER_GROUP_IGNORED",
            Event::FilterArgumentIgnored => "FILTER_ARGUMENT_IGNORED",

            Event::SortKeySkipped => "SORT_KEY_SKIPPED",
            Event::ProjectionPathSkipped => "PROJECTION_PATH_SKIPPED",

            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::NextLinkIssued => "NEXT_LINK_ISSUED",
            Event::DeltaLinkIssued => "DELTA_LINK_ISSUED",

            Event::TokenIssued => "TOKEN_ISSUED",
            Event::TokenResumed => "TOKEN_RESUMED",
            Event::TokenRejected => "TOKEN_REJECTED",
            Event::TokenEvicted => "TOKEN_EVICTED",
        }
    }

    /// Returns true if the event reports input that was silently ignored
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            Event::FilterClauseDropped
                | Event::FilterGroupIgnored
                | Event::FilterArgumentIgnored
                | Event::SortKeySkipped
                | Event::ProjectionPathSkipped
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
