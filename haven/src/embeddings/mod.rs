mod api;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{self, KvCache};
use crate::error::Result;

pub use api::{ApiConfig, EmbeddingApiClient};

/// Turns query text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Model name, part of the cache key.
    fn model(&self) -> &str;
}

/// Fronts an [`Embedder`] with the shared key-value cache.
///
/// Vectors are stored as JSON arrays. An entry that fails to parse is
/// treated as a miss and overwritten.
#[derive(Clone)]
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Arc<dyn KvCache>,
    ttl: Duration,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, cache: Arc<dyn KvCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = cache::embedding_key(self.inner.model(), text);

        if let Some(cached) = cache::lookup(self.cache.as_ref(), &key).await {
            match serde_json::from_str::<Vec<f32>>(&cached) {
                Ok(vector) => {
                    tracing::debug!("Embedding cache hit");
                    return Ok(vector);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid cached embedding, ignoring");
                }
            }
        }

        let vector = self.inner.embed_query(text).await?;

        match serde_json::to_string(&vector) {
            Ok(serialized) => cache::store(self.cache.as_ref(), &key, &serialized, self.ttl).await,
            Err(e) => tracing::warn!(error = %e, "Failed to serialize embedding for cache"),
        }

        Ok(vector)
    }
}
