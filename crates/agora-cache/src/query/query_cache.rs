//! Query cache with optimistic layers.
//!
//! Entries mirror store reads. An optimistic patch records the entry it
//! replaced (once per key) until the patch is settled or rolled back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agora_core::{CacheBridge, CacheEntry, CacheKey, CachePatch};
use dashmap::DashMap;
use parking_lot::Mutex;

/// In-process query cache
#[derive(Default)]
pub struct QueryCache {
    entries: DashMap<CacheKey, CacheEntry>,
    /// Pre-patch entries of unconfirmed optimistic patches
    layers: Mutex<HashMap<CacheKey, Option<CacheEntry>>>,
    invalidations: DashMap<CacheKey, u64>,
    total_invalidations: AtomicU64,
}

impl QueryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache behind an `Arc`
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an optimistic patch on `key` awaits settle or rollback
    pub fn has_pending(&self, key: &CacheKey) -> bool {
        self.layers.lock().contains_key(key)
    }

    /// How many times `key` was invalidated
    pub fn invalidation_count(&self, key: &CacheKey) -> u64 {
        self.invalidations.get(key).map_or(0, |count| *count)
    }

    /// Invalidations across all keys
    pub fn total_invalidations(&self) -> u64 {
        self.total_invalidations.load(Ordering::Relaxed)
    }

    fn restore(&self, key: CacheKey, previous: Option<CacheEntry>) {
        match previous {
            Some(entry) => {
                self.entries.insert(key, entry);
            }
            None => {
                self.entries.remove(&key);
            }
        }
    }
}

impl CacheBridge for QueryCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) {
        tracing::trace!(key = %key, "Cache put");
        self.entries.insert(key, entry);
    }

    fn invalidate(&self, key: &CacheKey) {
        self.layers.lock().remove(key);
        self.entries.remove(key);
        *self.invalidations.entry(*key).or_insert(0) += 1;
        self.total_invalidations.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(key = %key, "Cache entry invalidated");
    }

    fn patch_optimistically(&self, key: &CacheKey, patch: CachePatch) {
        // Held across read-modify-write so concurrent patches on one key serialize
        let mut layers = self.layers.lock();
        let current = self.get(key);

        layers.entry(*key).or_insert_with(|| current.clone());
        self.restore(*key, patch(current));

        tracing::trace!(key = %key, "Optimistic patch applied");
    }

    fn settle(&self, keys: &[CacheKey]) {
        let mut layers = self.layers.lock();
        for key in keys {
            layers.remove(key);
        }
    }

    fn rollback(&self, keys: &[CacheKey]) {
        let mut layers = self.layers.lock();
        for key in keys {
            if let Some(previous) = layers.remove(key) {
                self.restore(*key, previous);
                tracing::debug!(key = %key, "Optimistic patch rolled back");
            }
        }
    }
}
