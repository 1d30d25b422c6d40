use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ShelterIndex;
use crate::config::VectorStoreConfig;
use crate::error::{HavenError, Result};
use crate::models::{ScoredShelter, ShelterRecord};

/// Payload fields needed to format a result.
const PAYLOAD_FIELDS: &[&str] = &["name", "address", "phone", "website", "services", "lat", "lon"];

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: u32,
    with_payload: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    score_threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: Option<ShelterRecord>,
}

impl From<ScoredPoint> for ScoredShelter {
    fn from(point: ScoredPoint) -> Self {
        let mut record = point.payload.unwrap_or_default();
        if record.id.is_empty() {
            record.id = match point.id {
                serde_json::Value::String(id) => id,
                other => other.to_string(),
            };
        }
        ScoredShelter::new(record, point.score)
    }
}

/// Qdrant REST client for the shelter collection.
#[derive(Clone)]
pub struct QdrantClient {
    client: Client,
    base_url: String,
    collection: String,
    headers: HeaderMap,
}

impl QdrantClient {
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref api_key) = config.api_key {
            headers.insert(
                "api-key",
                HeaderValue::from_str(api_key)
                    .map_err(|e| HavenError::VectorStore(format!("Invalid API key header: {e}")))?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HavenError::VectorStore(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            headers,
        })
    }
}

#[async_trait]
impl ShelterIndex for QdrantClient {
    async fn search(
        &self,
        vector: &[f32],
        limit: u32,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredShelter>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let request = SearchRequest {
            vector,
            limit,
            with_payload: PAYLOAD_FIELDS,
            score_threshold,
        };

        let resp = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| HavenError::VectorStore(format!("Search request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HavenError::VectorStore(format!(
                "Search failed with {status}: {body}"
            )));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| HavenError::VectorStore(format!("Failed to parse search response: {e}")))?;

        Ok(body.result.into_iter().map(ScoredShelter::from).collect())
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
