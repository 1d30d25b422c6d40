use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::config::{parse_llm_provider_model, LlmConfig};
use crate::error::{HavenError, Result};
use crate::llm::api::LlmApiClient;
use crate::models::ChatPrompt;

/// Ordered text fragments of a streamed completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAI,
    Groq,
    OpenRouter,
    Ollama,
    LmStudio,
    OpenAICompatible { base_url: String },
    Unavailable { reason: String },
}

impl LlmBackend {
    pub fn name(&self) -> &'static str {
        match self {
            LlmBackend::OpenAI => "openai",
            LlmBackend::Groq => "groq",
            LlmBackend::OpenRouter => "openrouter",
            LlmBackend::Ollama => "ollama",
            LlmBackend::LmStudio => "lmstudio",
            LlmBackend::OpenAICompatible { .. } => "openai-compatible",
            LlmBackend::Unavailable { .. } => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A chat model that answers with a stream of text fragments.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream_chat(
        &self,
        prompt: &ChatPrompt,
        options: &CompletionOptions,
    ) -> Result<TextStream>;

    fn backend_name(&self) -> &str {
        "custom"
    }

    fn model_name(&self) -> Option<&str> {
        None
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Clone)]
pub struct LlmProvider {
    backend: LlmBackend,
    config: Option<LlmConfig>,
    client: Option<LlmApiClient>,
}

impl LlmProvider {
    pub fn new(config: Option<&LlmConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No LLM configuration provided");
        };

        let (provider, _model) = parse_llm_provider_model(&config.model);

        let backend = match provider.to_lowercase().as_str() {
            "openai" => LlmBackend::OpenAI,
            "groq" => LlmBackend::Groq,
            "openrouter" => LlmBackend::OpenRouter,
            "ollama" => LlmBackend::Ollama,
            "lmstudio" => LlmBackend::LmStudio,
            _ => {
                if let Some(base_url) = &config.base_url {
                    LlmBackend::OpenAICompatible {
                        base_url: base_url.clone(),
                    }
                } else {
                    return Self::unavailable(&format!(
                        "Unknown provider in model: {}",
                        config.model
                    ));
                }
            }
        };

        match LlmApiClient::new(config) {
            Ok(client) => Self {
                backend,
                config: Some(config.clone()),
                client: Some(client),
            },
            Err(e) => Self::unavailable(&e.to_string()),
        }
    }

    /// Pick the primary model, or the fallback when the primary does not
    /// answer a model-list probe.
    pub async fn select(primary: Option<&LlmConfig>, fallback: Option<&LlmConfig>) -> Self {
        let provider = Self::new(primary);

        let Some(fallback) = fallback else {
            return provider;
        };

        match &provider.client {
            Some(client) => match client.probe().await {
                Ok(()) => {
                    tracing::info!("Using {} API", provider.backend.name());
                    return provider;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "{} not available, falling back to {}",
                        provider.backend.name(),
                        fallback.model
                    );
                }
            },
            None => {
                tracing::warn!(
                    "Primary LLM unavailable ({}), falling back to {}",
                    provider.unavailable_reason(),
                    fallback.model
                );
            }
        }

        Self::new(Some(fallback))
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: LlmBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
            client: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, LlmBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &LlmBackend {
        &self.backend
    }

    pub fn config(&self) -> Option<&LlmConfig> {
        self.config.as_ref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.client.as_ref().map(LlmApiClient::base_url)
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            LlmBackend::Unavailable { reason } => reason.clone(),
            _ => "LLM client not initialized".to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for LlmProvider {
    async fn stream_chat(
        &self,
        prompt: &ChatPrompt,
        options: &CompletionOptions,
    ) -> Result<TextStream> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| HavenError::LlmUnavailable(self.unavailable_reason()))?;
        client.stream_chat(prompt, options).await
    }

    fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn model_name(&self) -> Option<&str> {
        self.client.as_ref().map(LlmApiClient::model)
    }

    fn is_available(&self) -> bool {
        LlmProvider::is_available(self)
    }
}
