//! A small typed fetch cache.
//!
//! Entries are keyed by a structured key (resource kind plus its
//! parameters), not by URL strings, so invalidation after a mutation is an
//! exact-match operation rather than a prefix scan. Every mutator is
//! expected to invalidate the keys it dirtied; the periodic TTL only
//! covers background staleness.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::{ConnectorIndexingStatus, Credential, SourceType};

/// What a cached fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CredentialsFor { source: SourceType, editable: bool },
    IndexingStatus { editable: bool },
}

/// Decoded payload of a cached fetch.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    Credentials(Vec<Credential>),
    Statuses(Vec<ConnectorIndexingStatus>),
}

struct Slot {
    fetched_at: Instant,
    entry: CacheEntry,
}

pub struct FetchCache {
    ttl: Duration,
    slots: HashMap<CacheKey, Slot>,
}

impl FetchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: HashMap::new(),
        }
    }

    /// Return the entry for `key` if it is still within its TTL.
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        let slot = self.slots.get(key)?;
        if slot.fetched_at.elapsed() > self.ttl {
            return None;
        }
        Some(&slot.entry)
    }

    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        self.slots.insert(
            key,
            Slot {
                fetched_at: Instant::now(),
                entry,
            },
        );
    }

    /// Drop a single key. Exact match only.
    pub fn invalidate(&mut self, key: &CacheKey) {
        self.slots.remove(key);
    }

    /// Drop both credential listings for a source, after any credential
    /// mutation.
    pub fn invalidate_credentials(&mut self, source: SourceType) {
        for editable in [false, true] {
            self.invalidate(&CacheKey::CredentialsFor { source, editable });
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
