//! Cache-keyed continuation tokens
//!
//! The encoded query stays on the server; the token is a short key into a
//! concurrent map. Keys are the first 8 bytes of a SHA-256 over the schema
//! name and the encoded query, so identical queries share one entry
//! (last writer wins).
//!
//! Entries expire after the configured TTL and the map is bounded; when it
//! is full the oldest issued entries go first. Tokens only resolve in the
//! process that issued them.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, FixedOffset};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use super::clock::{Clock, SystemClock};
use super::ContinuationTokenGenerator;
use crate::cursor::{BinaryQueryCodec, CursorResult, QuerySerializer};
use crate::observability::{Event, MetricsRegistry};
use crate::query::ResourceQuery;
use crate::schema::Schema;

#[derive(Debug, Clone)]
struct CacheEntry {
    schema: String,
    issued_at: DateTime<FixedOffset>,
    bytes: Arc<[u8]>,
}

/// Builds short tokens backed by an in-process store
pub struct CachedTokenGenerator {
    entries: DashMap<u64, CacheEntry>,
    ttl: Option<chrono::Duration>,
    capacity: usize,
    clock: Arc<dyn Clock>,
    serializer: Arc<dyn QuerySerializer>,
    metrics: Arc<MetricsRegistry>,
}

impl CachedTokenGenerator {
    /// Creates a store. `ttl` of `None` keeps entries until evicted by capacity.
    pub fn new(ttl: Option<Duration>, capacity: usize, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok()),
            capacity: capacity.max(1),
            clock: Arc::new(SystemClock),
            serializer: Arc::new(BinaryQueryCodec),
            metrics,
        }
    }

    /// Replaces the issue-time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of cached queries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key_for(context: &Schema, bytes: &[u8]) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(context.name().as_bytes());
        hasher.update([0u8]);
        hasher.update(bytes);
        let digest = hasher.finalize();

        let mut key = [0u8; 8];
        key.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(key)
    }

    fn decode_key(token: &str) -> Option<u64> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
        let key: [u8; 8] = bytes.try_into().ok()?;
        Some(u64::from_be_bytes(key))
    }

    fn is_expired(&self, issued_at: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> bool {
        self.ttl.map_or(false, |ttl| *now - *issued_at >= ttl)
    }

    /// Drops expired entries, then the oldest ones until `room` slots are free.
    /// Returns the number of entries removed.
    fn evict(&self, now: &DateTime<FixedOffset>, room: usize) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !self.is_expired(&entry.issued_at, now));

        let limit = self.capacity.saturating_sub(room);
        if self.entries.len() > limit {
            let mut by_age: Vec<(DateTime<FixedOffset>, u64)> = self
                .entries
                .iter()
                .map(|e| (e.value().issued_at, *e.key()))
                .collect();
            by_age.sort();

            let excess = self.entries.len() - limit;
            for (_, key) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.metrics.add_tokens_evicted(removed as u64);
            tracing::debug!(event = %Event::TokenEvicted, removed, remaining = self.entries.len());
        }
        removed
    }

    /// Removes expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.evict(&self.clock.now(), 0)
    }
}

impl ContinuationTokenGenerator for CachedTokenGenerator {
    fn build(&self, context: &Schema, query: &ResourceQuery) -> CursorResult<String> {
        let bytes = self.serializer.encode(query)?;
        let key = Self::key_for(context, &bytes);
        let now = self.clock.now();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict(&now, 1);
        }
        self.entries.insert(
            key,
            CacheEntry {
                schema: context.name().to_string(),
                issued_at: now,
                bytes: bytes.into(),
            },
        );

        Ok(URL_SAFE_NO_PAD.encode(key.to_be_bytes()))
    }

    fn parse(&self, context: &Schema, token: &str) -> Option<ResourceQuery> {
        let key = Self::decode_key(token)?;
        let entry = self.entries.get(&key).map(|e| e.value().clone());
        let Some(entry) = entry else {
            tracing::debug!(event = %Event::TokenRejected, schema = context.name(), reason = "unknown key");
            return None;
        };

        if entry.schema != context.name() {
            tracing::debug!(
                event = %Event::TokenRejected,
                schema = context.name(),
                issued_for = entry.schema.as_str(),
                reason = "schema mismatch"
            );
            return None;
        }

        if self.is_expired(&entry.issued_at, &self.clock.now()) {
            if self.entries.remove(&key).is_some() {
                self.metrics.add_tokens_evicted(1);
            }
            tracing::debug!(event = %Event::TokenRejected, schema = context.name(), reason = "expired");
            return None;
        }

        let mut query = match self.serializer.decode(&entry.bytes) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(event = %Event::TokenRejected, schema = context.name(), code = e.code(), error = %e);
                return None;
            }
        };
        query.as_of = if query.is_delta_query {
            Some(entry.issued_at)
        } else {
            None
        };
        Some(query)
    }
}
