//! Continuation Tokens
//!
//! Two interchangeable strategies turn a `ResourceQuery` into an opaque
//! string and back:
//! - `PortableTokenGenerator`: the token carries schema name, issue time and
//!   the encoded query
//! - `CachedTokenGenerator`: the token is a short key into a bounded,
//!   expiring in-process store
//!
//! Parsing never fails loudly. A token that is malformed, foreign to the
//! expected schema or expired yields `None`.

mod cache;
mod clock;
mod encoding;
mod portable;

use std::fmt;
use std::sync::Arc;

pub use cache::CachedTokenGenerator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use encoding::{Base64UrlEncoder, TokenEncoder};
pub use portable::{PortableTokenGenerator, TokenContents};

use crate::config::{CrudOptions, TokenStrategy};
use crate::cursor::CursorResult;
use crate::observability::MetricsRegistry;
use crate::query::ResourceQuery;
use crate::schema::Schema;

/// Builds and parses continuation tokens for one schema at a time
pub trait ContinuationTokenGenerator: Send + Sync {
    /// Produces a token for `query`, issued for `context`
    fn build(&self, context: &Schema, query: &ResourceQuery) -> CursorResult<String>;

    /// Restores a query. `None` for malformed, foreign or expired tokens.
    fn parse(&self, context: &Schema, token: &str) -> Option<ResourceQuery>;
}

/// Creates the generator selected by `options.token_strategy`
pub fn generator_for(options: &CrudOptions, metrics: Arc<MetricsRegistry>) -> Arc<dyn ContinuationTokenGenerator> {
    match options.token_strategy {
        TokenStrategy::Portable => Arc::new(PortableTokenGenerator::new()),
        TokenStrategy::Cached => Arc::new(CachedTokenGenerator::new(
            options.token_ttl(),
            options.token_cache_capacity,
            metrics,
        )),
    }
}

/// Link flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Next,
    Delta,
}

impl LinkKind {
    /// Path segment that precedes the token
    pub fn segment(&self) -> &'static str {
        match self {
            LinkKind::Next => "nextLink",
            LinkKind::Delta => "deltaLink",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment())
    }
}

/// `{server_uri}/nextLink/{token}` or `{server_uri}/deltaLink/{token}`.
/// A trailing `/` on the base is dropped; no base yields a relative link.
pub fn build_link(server_uri: Option<&str>, kind: LinkKind, token: &str) -> String {
    let base = server_uri.unwrap_or_default().trim().trim_end_matches('/');
    format!("{}/{}/{}", base, kind.segment(), token)
}

/// Splits a link into its kind and token.
///
/// Accepts absolute URLs, paths, or a bare token (kind `None`). Segment
/// names match case-insensitively; the token ends at `/`, `?` or `#`.
pub fn parse_link(link: &str) -> (Option<LinkKind>, &str) {
    let link = link.trim();
    for kind in [LinkKind::Next, LinkKind::Delta] {
        let marker = format!("/{}/", kind.segment().to_ascii_lowercase());
        if let Some(at) = link.to_ascii_lowercase().rfind(&marker) {
            let rest = &link[at + marker.len()..];
            let end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
            return (Some(kind), &rest[..end]);
        }
    }
    (None, link)
}
