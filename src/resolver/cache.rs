//! Release metadata cache
//!
//! Responses are kept per URL with their own time-to-live. The cache is an explicit
//! value owned by the caller and passed to the resolver; nothing is process-global.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::Result;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Vec<u8>,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

/// TTL cache of metadata responses keyed by URL
#[derive(Debug, Clone)]
pub struct MetadataCache {
    entries: HashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl MetadataCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    /// Fresh body for `key` as of `now`
    pub fn get(&self, key: &str, now: Instant) -> Option<&[u8]> {
        self.entries
            .get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.body.as_slice())
    }

    pub fn insert(&mut self, key: &str, body: Vec<u8>, now: Instant) {
        self.insert_with_ttl(key, body, now, self.default_ttl);
    }

    pub fn insert_with_ttl(&mut self, key: &str, body: Vec<u8>, now: Instant, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                fetched_at: now,
                ttl,
            },
        );
    }

    /// Return the cached body or run `fetch` and cache its result
    pub fn get_or_fetch<F>(&mut self, key: &str, fetch: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let now = Instant::now();
        if let Some(body) = self.get(key, now) {
            tracing::debug!(%key, "metadata cache hit");
            return Ok(body.to_vec());
        }
        self.prune(now);
        let body = fetch()?;
        self.insert(key, body.clone(), now);
        Ok(body)
    }

    /// Drop expired entries
    pub fn prune(&mut self, now: Instant) {
        self.entries.retain(|_, e| e.is_fresh(now));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
