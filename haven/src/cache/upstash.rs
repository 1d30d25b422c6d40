use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::KvCache;
use crate::error::{HavenError, Result};

const REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct UpstashResponse {
    result: Option<serde_json::Value>,
    error: Option<String>,
}

/// Upstash Redis over its REST API (`GET /get/{key}`, `POST /set/{key}?EX=`).
#[derive(Clone)]
pub struct UpstashCache {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl UpstashCache {
    pub fn new(url: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(HavenError::Cache(format!("Invalid Upstash URL: {url}")));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| HavenError::Cache(format!("Invalid Upstash token header: {e}")))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| HavenError::Cache(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            headers,
        })
    }

    fn command_url(&self, command: &str, key: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HavenError::Cache("Upstash URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(command)
            .push(key);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Option<serde_json::Value>> {
        let resp = request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| HavenError::Cache(format!("Upstash request failed: {e}")))?;

        let status = resp.status();
        let body: UpstashResponse = resp
            .json()
            .await
            .map_err(|e| HavenError::Cache(format!("Invalid Upstash response ({status}): {e}")))?;

        if let Some(error) = body.error {
            return Err(HavenError::Cache(format!("Upstash error {status}: {error}")));
        }
        if !status.is_success() {
            return Err(HavenError::Cache(format!("Upstash error {status}")));
        }

        Ok(body.result)
    }
}

#[async_trait]
impl KvCache for UpstashCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let url = self.command_url("get", key)?;
        match self.send(self.client.get(url)).await? {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(value)) => Ok(Some(value)),
            // Values written by other clients may come back as raw JSON.
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut url = self.command_url("set", key)?;
        url.query_pairs_mut()
            .append_pair("EX", &ttl.as_secs().max(1).to_string());

        self.send(self.client.post(url).body(value.to_string()))
            .await
            .map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "upstash"
    }
}
