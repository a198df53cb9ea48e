//! Byte-bounded LRU cache in front of an [`ObjectStore`].
//!
//! Entries are keyed by image id and representation. The cache tracks the
//! total size of cached bodies and evicts least-recently-used entries once
//! the capacity is exceeded. Objects larger than the whole capacity are served
//! but never cached.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::trace;

use super::{ObjectStore, StoredObject};
use crate::error::StoreError;
use crate::tier::Representation;

/// Default cache capacity: 256MB
pub const DEFAULT_CACHE_CAPACITY: usize = 256 * 1024 * 1024;

const DEFAULT_MAX_ENTRIES: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(n) => n,
    None => unreachable!(),
};

type CacheKey = (String, Representation);

struct Inner {
    entries: LruCache<CacheKey, StoredObject>,
    current_size: usize,
}

/// Caching wrapper around another store.
pub struct CachedStore<S> {
    inner: S,
    cache: RwLock<Inner>,
    max_size: usize,
}

impl<S: ObjectStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: S, max_size: usize) -> Self {
        Self::with_capacity_and_entries(inner, max_size, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity_and_entries(inner: S, max_size: usize, max_entries: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: RwLock::new(Inner {
                entries: LruCache::new(max_entries),
                current_size: 0,
            }),
            max_size,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Whether an object is cached, without touching LRU order.
    pub async fn contains(&self, image_id: &str, representation: &Representation) -> bool {
        let cache = self.cache.read().await;
        cache
            .entries
            .contains(&(image_id.to_string(), representation.clone()))
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.entries.is_empty()
    }

    /// Total bytes currently cached.
    pub async fn size(&self) -> usize {
        self.cache.read().await.current_size
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    async fn put(&self, key: CacheKey, object: StoredObject) {
        let object_size = object.len();
        if object_size > self.max_size {
            return;
        }

        let mut cache = self.cache.write().await;

        // Returns the replaced value for an existing key, or the entry evicted
        // by a full table
        if let Some((_, evicted)) = cache.entries.push(key, object) {
            cache.current_size = cache.current_size.saturating_sub(evicted.len());
        }
        cache.current_size += object_size;

        while cache.current_size > self.max_size {
            match cache.entries.pop_lru() {
                Some((_, evicted)) => {
                    cache.current_size = cache.current_size.saturating_sub(evicted.len());
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for CachedStore<S> {
    async fn fetch(
        &self,
        image_id: &str,
        representation: &Representation,
    ) -> Result<StoredObject, StoreError> {
        let key = (image_id.to_string(), representation.clone());

        if let Some(hit) = self.cache.write().await.entries.get(&key) {
            trace!(image_id, representation = %representation, "Cache hit");
            return Ok(hit.clone());
        }

        let object = self.inner.fetch(image_id, representation).await?;
        self.put(key, object.clone()).await;
        Ok(object)
    }
}
