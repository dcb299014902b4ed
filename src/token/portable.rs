//! Self-describing continuation tokens
//!
//! Payload: nullable schema name, nullable issue timestamp, then the
//! encoded query. The payload is base64 encoded, so any node can resume
//! the token without shared state.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::clock::{Clock, SystemClock};
use super::encoding::{Base64UrlEncoder, TokenEncoder};
use super::ContinuationTokenGenerator;
use crate::cursor::{BinaryQueryCodec, CursorResult, QuerySerializer, WireReader, WireWriter};
use crate::observability::Event;
use crate::query::ResourceQuery;
use crate::schema::Schema;

/// Decoded payload of a portable token, without the schema check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenContents {
    pub schema: Option<String>,
    pub issued_at: Option<DateTime<FixedOffset>>,
    pub query: ResourceQuery,
}

/// Builds tokens that carry the whole query
pub struct PortableTokenGenerator {
    clock: Arc<dyn Clock>,
    encoder: Arc<dyn TokenEncoder>,
    serializer: Arc<dyn QuerySerializer>,
}

impl PortableTokenGenerator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            encoder: Arc::new(Base64UrlEncoder),
            serializer: Arc::new(BinaryQueryCodec),
        }
    }

    /// Replaces the text encoding
    pub fn with_encoder(mut self, encoder: Arc<dyn TokenEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Decodes a token for display. `None` when it does not decode.
    pub fn inspect(&self, token: &str) -> Option<TokenContents> {
        let bytes = self.encoder.decode(token)?;
        let mut reader = WireReader::new(&bytes);
        Some(TokenContents {
            schema: reader.read_nullable_string().ok()?,
            issued_at: reader.read_nullable_timestamp().ok()?,
            query: self.serializer.deserialize(&mut reader).ok()?,
        })
    }

    fn reject(context: &Schema, reason: &str) -> Option<ResourceQuery> {
        tracing::debug!(event = %Event::TokenRejected, schema = context.name(), reason);
        None
    }
}

impl Default for PortableTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ContinuationTokenGenerator for PortableTokenGenerator {
    fn build(&self, context: &Schema, query: &ResourceQuery) -> CursorResult<String> {
        let mut writer = WireWriter::new();
        writer.write_nullable_string(Some(context.name()))?;
        writer.write_nullable_timestamp(Some(&self.clock.now()));
        self.serializer.serialize(query, &mut writer)?;

        Ok(self.encoder.encode(&writer.into_bytes()))
    }

    fn parse(&self, context: &Schema, token: &str) -> Option<ResourceQuery> {
        if token.trim().is_empty() {
            return None;
        }
        let Some(bytes) = self.encoder.decode(token) else {
            return Self::reject(context, "encoding");
        };

        let mut reader = WireReader::new(&bytes);
        let issued_for = match reader.read_nullable_string() {
            Ok(Some(name)) if !name.trim().is_empty() => name,
            Ok(_) => return Self::reject(context, "missing schema"),
            Err(_) => return Self::reject(context, "truncated"),
        };
        if issued_for != context.name() {
            tracing::debug!(
                event = %Event::TokenRejected,
                schema = context.name(),
                issued_for = issued_for.as_str(),
                reason = "schema mismatch"
            );
            return None;
        }

        let decoded = reader
            .read_nullable_timestamp()
            .and_then(|issued_at| Ok((issued_at, self.serializer.deserialize(&mut reader)?)));
        let (issued_at, mut query) = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(
                    event = %Event::TokenRejected,
                    schema = context.name(),
                    code = e.code(),
                    error = %e
                );
                return None;
            }
        };

        query.as_of = if query.is_delta_query { issued_at } else { None };
        Some(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::WeatherForecast;
    use crate::query::Paging;
    use crate::schema::{FieldKind, Record, ScalarType};
    use crate::token::FixedClock;
    use chrono::DateTime;

    fn issued() -> chrono::DateTime<chrono::FixedOffset> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00+00:00").unwrap()
    }

    fn generator() -> PortableTokenGenerator {
        PortableTokenGenerator::with_clock(Arc::new(FixedClock::new(issued())))
    }

    fn query(delta: bool) -> ResourceQuery {
        let mut query = ResourceQuery::new();
        query.filter = vec!["temperatureC gt 0".into()];
        query.paging = Some(Paging {
            page_offset: Some(0),
            page_size: Some(10),
            max_page_size: None,
        });
        query.is_delta_query = delta;
        query
    }

    #[test]
    fn test_round_trip_without_delta_drops_as_of() {
        let generator = generator();
        let schema = WeatherForecast::descriptor();
        let token = generator.build(schema, &query(false)).unwrap();

        let parsed = generator.parse(schema, &token).unwrap();
        assert_eq!(parsed.filter, vec!["temperatureC gt 0".to_string()]);
        assert_eq!(parsed.as_of, None);
    }

    #[test]
    fn test_delta_restores_issue_time() {
        let generator = generator();
        let schema = WeatherForecast::descriptor();
        let token = generator.build(schema, &query(true)).unwrap();

        let parsed = generator.parse(schema, &token).unwrap();
        assert_eq!(parsed.as_of, Some(issued()));
    }

    #[test]
    fn test_foreign_schema_rejected() {
        let other: &'static Schema = Box::leak(Box::new(
            Schema::builder("tests::Other")
                .field("id", FieldKind::Scalar(ScalarType::Int))
                .build(),
        ));
        let generator = generator();
        let token = generator
            .build(WeatherForecast::descriptor(), &query(false))
            .unwrap();
        assert!(generator.parse(other, &token).is_none());
    }

    #[test]
    fn test_inspect_skips_schema_check() {
        let generator = generator();
        let token = generator
            .build(WeatherForecast::descriptor(), &query(false))
            .unwrap();

        let contents = generator.inspect(&token).unwrap();
        assert_eq!(contents.schema.as_deref(), Some("demo::WeatherForecast"));
        assert_eq!(contents.issued_at, Some(issued()));
        assert_eq!(contents.query.paging.and_then(|p| p.page_size), Some(10));
    }

    #[test]
    fn test_garbage_rejected() {
        let generator = generator();
        let schema = WeatherForecast::descriptor();
        assert!(generator.parse(schema, "").is_none());
        assert!(generator.parse(schema, "%%%").is_none());
        assert!(generator.parse(schema, "AAAA").is_none());

        let token = generator.build(schema, &query(false)).unwrap();
        assert!(generator.parse(schema, &token[..token.len() / 2]).is_none());
    }
}
