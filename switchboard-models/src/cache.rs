//! TTL-bounded LRU cache for per-provider model lists.
//!
//! One entry per provider id, overwritten wholesale on refresh. Entries
//! expire after a fixed TTL and are removed lazily on read. Capacity is
//! bounded; inserting beyond it evicts the least-recently-accessed entry.
//!
//! The cache is pure in-memory state with no I/O. It is the only shared
//! mutable state between in-flight aggregation calls, created once per
//! catalog and accessed under an internal lock.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::debug;
use uuid::Uuid;

use crate::types::ModelDescriptor;

struct CacheEntry {
    models: Vec<ModelDescriptor>,
    expires_at: Instant,
}

/// Process-wide cache of the most recent successful model fetch per provider.
pub struct ModelCache {
    entries: Mutex<LruCache<Uuid, CacheEntry>>,
    ttl: Duration,
}

impl ModelCache {
    /// Create a cache with the given capacity and TTL.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Get the cached model list for a provider.
    ///
    /// Returns `None` if there is no entry or the entry has expired; an
    /// expired entry is removed. A hit counts as an access for LRU order.
    pub fn get(&self, provider_id: &Uuid) -> Option<Vec<ModelDescriptor>> {
        let mut entries = self.entries.lock().unwrap();
        let expired = match entries.get(provider_id) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(%provider_id, "model cache hit");
                return Some(entry.models.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!(%provider_id, "model cache entry expired");
            entries.pop(provider_id);
        }
        None
    }

    /// Store a freshly fetched model list with expiry `now + ttl`.
    ///
    /// Replaces any existing entry for the provider. Evicts the
    /// least-recently-accessed entry when capacity would be exceeded.
    pub fn put(&self, provider_id: Uuid, models: Vec<ModelDescriptor>) {
        let entry = CacheEntry {
            models,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().unwrap().put(provider_id, entry);
    }

    /// Remove a provider's entry, if present.
    pub fn invalidate(&self, provider_id: &Uuid) {
        self.entries.lock().unwrap().pop(provider_id);
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of entries currently held, including not-yet-collected
    /// expired ones.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
