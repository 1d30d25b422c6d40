mod qdrant;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ScoredShelter;

pub use qdrant::QdrantClient;

/// Similarity search over the shelter collection.
#[async_trait]
pub trait ShelterIndex: Send + Sync {
    /// Nearest shelters to `vector`, best match first.
    async fn search(
        &self,
        vector: &[f32],
        limit: u32,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredShelter>>;

    fn collection(&self) -> &str;
}
