use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::KvCache;
use crate::error::{HavenError, Result};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Thread-safe in-process LRU cache with per-entry expiry.
///
/// Used when no hosted cache is configured. Expired entries are dropped on
/// read; the LRU bound keeps memory flat regardless.
#[derive(Clone)]
pub struct MemoryCache {
    cache: Arc<Mutex<LruCache<String, Entry>>>,
}

impl MemoryCache {
    /// A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|e| HavenError::Cache(format!("Cache lock poisoned: {e}")))?;

        let expired = match cache.get(key) {
            None => return Ok(None),
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()))
            }
            Some(_) => true,
        };

        if expired {
            cache.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|e| HavenError::Cache(format!("Cache lock poisoned: {e}")))?;
        cache.put(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
