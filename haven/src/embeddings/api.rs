use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Embedder;
use crate::config::{default_base_url, parse_provider_model, EmbeddingsConfig};
use crate::error::{HavenError, Result};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn from_embeddings_config(config: &EmbeddingsConfig) -> Self {
        let (provider, model) = parse_provider_model(&config.model);
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: model.to_string(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct EmbeddingApiClient {
    client: Client,
    config: ApiConfig,
}

impl EmbeddingApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HavenError::Embedding(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let needs_api_key = self.config.base_url == default_base_url("openai");
        if needs_api_key && self.config.api_key.is_none() {
            return Err(HavenError::Embedding("Missing OPENAI_API_KEY".to_string()));
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts.to_vec(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = self.config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|e| HavenError::Embedding(format!("Invalid API key header: {e}")))?,
            );
        }

        let url = format!("{}/embeddings", self.config.base_url);

        let resp = self
            .client
            .post(&url)
            .headers(headers)
            .json(&request)
            .send()
            .await
            .map_err(|e| HavenError::Embedding(format!("Request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            let body: EmbeddingResponse = resp
                .json()
                .await
                .map_err(|e| HavenError::Embedding(format!("Failed to parse response: {e}")))?;
            return Ok(body.data.into_iter().map(|d| d.embedding).collect());
        }

        let body = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(HavenError::Embedding(format!(
                "Embedding API authentication failed: {body}"
            )));
        }

        Err(HavenError::Embedding(format!("API error {status}: {body}")))
    }
}

#[async_trait]
impl Embedder for EmbeddingApiClient {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        tracing::debug!(model = %self.config.model, "Creating embedding");
        self.embed(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HavenError::Embedding("No embedding returned".to_string()))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
