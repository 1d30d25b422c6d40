use serde::Deserialize;
use std::env;
use std::str::FromStr;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

/// Read a variable, treating an empty value the same as an unset one.
fn env_non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub embeddings: EmbeddingsConfig,
    pub vector_store: VectorStoreConfig,
    pub llm: Option<LlmConfig>,
    /// Used when the primary provider fails its start-up probe.
    pub llm_fallback: Option<LlmConfig>,
    pub cache: CacheConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub timeout_secs: u64,
}

/// LLM configuration for the streaming chat model
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Upstash,
    Memory,
    None,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upstash" | "redis" => Ok(Self::Upstash),
            "memory" | "lru" => Ok(Self::Memory),
            "none" | "off" | "disabled" => Ok(Self::None),
            other => Err(format!(
                "unknown cache backend '{other}' (expected upstash, memory or none)"
            )),
        }
    }
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstash => "upstash",
            Self::Memory => "memory",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub upstash_url: Option<String>,
    pub upstash_token: Option<String>,
    /// Entry limit for the in-process backend.
    pub capacity: usize,
    pub embedding_ttl_secs: u64,
    pub response_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            upstash_url: None,
            upstash_token: None,
            capacity: 1000,
            embedding_ttl_secs: 86400,
            response_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub search_limit: u32,
    pub score_threshold: Option<f32>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            search_limit: 6,
            score_threshold: Some(0.2),
            temperature: 0.3,
            max_tokens: 400,
        }
    }
}

fn llm_timeout() -> u64 {
    parse_env_or("LLM_TIMEOUT", 60)
}

fn openai_llm_config() -> Option<LlmConfig> {
    env_non_empty("OPENAI_API_KEY").map(|api_key| LlmConfig {
        model: format!(
            "openai/{}",
            env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
        ),
        api_key: Some(api_key),
        base_url: None,
        timeout_secs: llm_timeout(),
    })
}

fn groq_llm_config() -> Option<LlmConfig> {
    env_non_empty("GROQ_API_KEY").map(|api_key| LlmConfig {
        model: format!(
            "groq/{}",
            env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.1-70b-versatile".to_string())
        ),
        api_key: Some(api_key),
        base_url: None,
        timeout_secs: llm_timeout(),
    })
}

/// Resolve the primary and fallback chat models.
///
/// An explicit `LLM_MODEL` wins. Otherwise Groq is preferred when
/// `GROQ_API_KEY` is set, with OpenAI as the fallback.
fn resolve_llm() -> (Option<LlmConfig>, Option<LlmConfig>) {
    if let Some(model) = env_non_empty("LLM_MODEL") {
        let primary = LlmConfig {
            model,
            api_key: env_non_empty("LLM_API_KEY"),
            base_url: env_non_empty("LLM_BASE_URL"),
            timeout_secs: llm_timeout(),
        };
        return (Some(primary), None);
    }

    match groq_llm_config() {
        Some(groq) => (Some(groq), openai_llm_config()),
        None => (openai_llm_config(), None),
    }
}

fn resolve_cache_backend(upstash_configured: bool) -> CacheBackend {
    match parse_env_opt::<CacheBackend>("CACHE_BACKEND") {
        Some(CacheBackend::Upstash) if !upstash_configured => {
            tracing::warn!(
                "CACHE_BACKEND=upstash but UPSTASH_REDIS_REST_URL/UPSTASH_REDIS_REST_TOKEN are not set. Using in-memory cache."
            );
            CacheBackend::Memory
        }
        Some(backend) => backend,
        None if upstash_configured => CacheBackend::Upstash,
        None => CacheBackend::Memory,
    }
}

impl Default for Config {
    fn default() -> Self {
        let (llm, llm_fallback) = resolve_llm();

        let upstash_url = env_non_empty("UPSTASH_REDIS_REST_URL");
        let upstash_token = env_non_empty("UPSTASH_REDIS_REST_TOKEN");
        let backend = resolve_cache_backend(upstash_url.is_some() && upstash_token.is_some());

        Self {
            server: ServerConfig {
                host: env::var("HAVEN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("HAVEN_PORT", 3000),
                body_limit_bytes: parse_env_or("HAVEN_BODY_LIMIT", 64 * 1024),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDINGS_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                api_key: env_non_empty("OPENAI_API_KEY"),
                base_url: env_non_empty("EMBEDDINGS_BASE_URL"),
                timeout_secs: parse_env_or("EMBEDDINGS_TIMEOUT", 30),
            },
            vector_store: VectorStoreConfig {
                url: env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6333".to_string()),
                api_key: env_non_empty("QDRANT_API_KEY"),
                collection: env::var("QDRANT_COLLECTION")
                    .unwrap_or_else(|_| "shelters".to_string()),
                timeout_secs: parse_env_or("QDRANT_TIMEOUT", 10),
            },
            llm,
            llm_fallback,
            cache: CacheConfig {
                backend,
                upstash_url,
                upstash_token,
                capacity: parse_env_or("CACHE_CAPACITY", 1000),
                embedding_ttl_secs: parse_env_or("EMBEDDING_CACHE_TTL_SECS", 86400),
                response_ttl_secs: parse_env_or("RESPONSE_CACHE_TTL_SECS", 3600),
            },
            chat: ChatConfig {
                search_limit: parse_env_or("SEARCH_LIMIT", 6),
                score_threshold: match env::var("SEARCH_SCORE_THRESHOLD") {
                    Ok(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
                    Ok(_) => parse_env_opt("SEARCH_SCORE_THRESHOLD").or(Some(0.2)),
                    Err(_) => Some(0.2),
                },
                temperature: parse_env_or("CHAT_TEMPERATURE", 0.3),
                max_tokens: parse_env_or("CHAT_MAX_TOKENS", 400),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known embedding providers that use OpenAI-compatible APIs
const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "groq", "openrouter", "ollama", "lmstudio"];

/// Parse an embedding model name into (provider, model) tuple.
///
/// Unprefixed names are OpenAI models.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("openai", model)
}

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}

/// Provider-specific default base URLs
pub fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => "https://api.openai.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "lmstudio" => "http://localhost:1234/v1",
        _ => "https://api.openai.com/v1",
    }
}
