//! Locator-keyed document cache
//!
//! Fetched documents are immutable once inscribed, so cached entries never
//! need invalidation. The cache is a bounded LRU with eviction as the only
//! removal path; concurrent writes for the same locator always carry
//! byte-identical content.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lru::LruCache;
use serde::Serialize;

use crate::registry::fetch::FetchedDocument;
use crate::registry::locator::Locator;

/// Cache usage counters for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Bounded in-memory cache of fetched documents
pub struct DocumentCache {
    entries: Mutex<LruCache<Locator, Arc<FetchedDocument>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DocumentCache {
    /// Create a cache holding at most `capacity` documents
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a cached document, promoting it to most recently used
    pub fn get(&self, locator: &Locator) -> Option<Arc<FetchedDocument>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(locator) {
            Some(doc) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(doc))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a fetched document, returning the shared handle
    pub fn put(&self, locator: Locator, document: FetchedDocument) -> Arc<FetchedDocument> {
        let document = Arc::new(document);
        let mut entries = self.entries.lock().unwrap();
        entries.put(locator, Arc::clone(&document));
        document
    }

    /// Current usage counters
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap();
        CacheStats {
            entries: entries.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
