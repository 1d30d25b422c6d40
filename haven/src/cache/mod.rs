//! String key-value cache with per-entry expiry.
//!
//! The cache only ever saves work: every caller treats a failed or corrupt
//! lookup as a miss and a failed write as a no-op.

mod memory;
mod upstash;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::config::{CacheBackend, CacheConfig};
use crate::error::{HavenError, Result};
use crate::models::UserLocation;

pub use memory::MemoryCache;
pub use upstash::UpstashCache;

#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    fn backend_name(&self) -> &'static str;
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl KvCache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

/// Build the configured backend.
pub fn from_config(config: &CacheConfig) -> Result<Arc<dyn KvCache>> {
    let cache: Arc<dyn KvCache> = match config.backend {
        CacheBackend::Upstash => {
            let (Some(url), Some(token)) = (&config.upstash_url, &config.upstash_token) else {
                return Err(HavenError::Cache(
                    "Upstash cache requires UPSTASH_REDIS_REST_URL and UPSTASH_REDIS_REST_TOKEN"
                        .to_string(),
                ));
            };
            Arc::new(UpstashCache::new(url, token)?)
        }
        CacheBackend::Memory => Arc::new(MemoryCache::new(config.capacity)),
        CacheBackend::None => Arc::new(NoopCache),
    };
    Ok(cache)
}

/// Look a key up, degrading any backend failure to a miss.
pub async fn lookup(cache: &dyn KvCache, key: &str) -> Option<String> {
    match cache.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, key, "Cache read failed, treating as miss");
            None
        }
    }
}

/// Store a value, logging and discarding any backend failure.
pub async fn store(cache: &dyn KvCache, key: &str, value: &str, ttl: Duration) {
    if let Err(e) = cache.set(key, value, ttl).await {
        tracing::warn!(error = %e, key, "Cache write failed");
    }
}

fn sha256_hex(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0u8]);
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Key for a cached query embedding.
pub fn embedding_key(model: &str, text: &str) -> String {
    format!("embed:{model}:{}", sha256_hex(&[model, text]))
}

/// Key for a cached chat response. Coordinates are rounded to three decimals
/// (about 100 m) so nearby requests share an entry.
pub fn response_key(query: &str, location: Option<UserLocation>) -> String {
    let hash = sha256_hex(&[query]);
    match location {
        Some(loc) => format!("resp:{hash}:{:.3}:{:.3}", loc.lat, loc.lon),
        None => format!("resp:{hash}:x:x"),
    }
}
