// Shared doubles and helpers for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use futures::stream;
use tower::ServiceExt;

use haven::api::{create_router, AppState};
use haven::cache::MemoryCache;
use haven::config::{
    CacheConfig, ChatConfig, Config, EmbeddingsConfig, ServerConfig, VectorStoreConfig,
};
use haven::embeddings::Embedder;
use haven::error::{HavenError, Result};
use haven::llm::{ChatModel, CompletionOptions, TextStream};
use haven::models::{ChatPrompt, ScoredShelter, ShelterRecord};
use haven::policy::KeywordPolicy;
use haven::search::ShelterIndex;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            body_limit_bytes: 64 * 1024,
        },
        embeddings: EmbeddingsConfig {
            model: "text-embedding-3-small".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: None,
            timeout_secs: 5,
        },
        vector_store: VectorStoreConfig {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "shelters".to_string(),
            timeout_secs: 5,
        },
        llm: None,
        llm_fallback: None,
        cache: CacheConfig::default(),
        chat: ChatConfig::default(),
    }
}

pub fn shelter(name: &str, lat: f64, lon: f64) -> ScoredShelter {
    ScoredShelter::new(
        ShelterRecord {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            address: Some(format!("{name} address, Dallas, TX")),
            phone: Some("(214) 555-0100".to_string()),
            lat: Some(lat),
            lon: Some(lon),
            ..Default::default()
        },
        0.7,
    )
}

pub struct StaticEmbedder {
    pub calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0.1, 0.2, 0.3])
    }

    fn model(&self) -> &str {
        "test-embedding"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        Err(HavenError::Embedding("Missing OPENAI_API_KEY".to_string()))
    }

    fn model(&self) -> &str {
        "test-embedding"
    }
}

pub struct StaticIndex {
    hits: Vec<ScoredShelter>,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<(u32, Option<f32>)>>,
}

impl StaticIndex {
    pub fn new(hits: Vec<ScoredShelter>) -> Self {
        Self {
            hits,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShelterIndex for StaticIndex {
    async fn search(
        &self,
        _vector: &[f32],
        limit: u32,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredShelter>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some((limit, score_threshold));
        Ok(self.hits.clone())
    }

    fn collection(&self) -> &str {
        "shelters"
    }
}

/// What the scripted model does when asked for a completion.
#[derive(Clone)]
pub enum Script {
    Fragments(Vec<&'static str>),
    /// Sends the fragments, then fails.
    FailMidStream(Vec<&'static str>),
    /// The stream opens but its first item is an error.
    FailFirstItem,
    /// The request itself is rejected.
    SetupError,
}

pub struct ScriptedModel {
    script: Script,
    pub prompts: Mutex<Vec<ChatPrompt>>,
    pub options: Mutex<Vec<CompletionOptions>>,
}

impl ScriptedModel {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> ChatPrompt {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("model was never called")
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn stream_chat(
        &self,
        prompt: &ChatPrompt,
        options: &CompletionOptions,
    ) -> Result<TextStream> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.options.lock().unwrap().push(options.clone());

        let items: Vec<Result<String>> = match &self.script {
            Script::Fragments(fragments) => {
                fragments.iter().map(|f| Ok(f.to_string())).collect()
            }
            Script::FailMidStream(fragments) => fragments
                .iter()
                .map(|f| Ok(f.to_string()))
                .chain(std::iter::once(Err(HavenError::Llm(
                    "LLM stream error: connection reset".to_string(),
                ))))
                .collect(),
            Script::FailFirstItem => vec![Err(HavenError::Llm(
                "LLM stream error: Invalid status code: 401 Unauthorized".to_string(),
            ))],
            Script::SetupError => {
                return Err(HavenError::Llm("LLM request failed: timed out".to_string()))
            }
        };

        Ok(Box::pin(stream::iter(items)))
    }

    fn backend_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> Option<&str> {
        Some("scripted-model")
    }
}

pub struct Harness {
    pub embedder: Arc<StaticEmbedder>,
    pub index: Arc<StaticIndex>,
    pub model: Arc<ScriptedModel>,
    pub cache: Arc<MemoryCache>,
    pub router: Router,
}

pub fn harness(hits: Vec<ScoredShelter>, script: Script) -> Harness {
    init_test_logger();

    let embedder = Arc::new(StaticEmbedder::new());
    let index = Arc::new(StaticIndex::new(hits));
    let model = Arc::new(ScriptedModel::new(script));
    let cache = Arc::new(MemoryCache::new(64));

    let state = AppState::new(
        test_config(),
        embedder.clone(),
        index.clone(),
        model.clone(),
        cache.clone(),
        Arc::new(KeywordPolicy),
    );

    Harness {
        embedder,
        index,
        model,
        cache,
        router: create_router(state),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is JSON")
    }
}

pub async fn post_raw(router: &Router, body: &str) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub async fn post_chat(router: &Router, body: serde_json::Value) -> TestResponse {
    post_raw(router, &body.to_string()).await
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

/// Give spawned cache writes a chance to finish.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
