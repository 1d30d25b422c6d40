use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionStreamResponse,
    },
    Client,
};
use futures::StreamExt;

use crate::{
    config::{default_base_url, parse_llm_provider_model, LlmConfig},
    error::{HavenError, Result},
    llm::provider::{CompletionOptions, TextStream},
    models::ChatPrompt,
};

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
}

#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(HavenError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                HavenError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries 429/5xx with exponential backoff by default.
        // Upstream failures are terminal for a request, so disable that.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Cheap reachability check: list the provider's models.
    pub async fn probe(&self) -> Result<()> {
        self.client
            .models()
            .list()
            .await
            .map(|_| ())
            .map_err(Self::map_openai_error)
    }

    /// Start a streamed completion. Each stream item is one text fragment;
    /// fragments may be empty (role-only or usage-only chunks).
    pub async fn stream_chat(
        &self,
        prompt: &ChatPrompt,
        options: &CompletionOptions,
    ) -> Result<TextStream> {
        if prompt.user.trim().is_empty() {
            return Err(HavenError::Validation("Prompt cannot be empty".to_string()));
        }

        let request = self.build_request(prompt, options)?;
        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(Self::map_openai_error)?;

        Ok(Box::pin(stream.map(|item| {
            item.map(Self::extract_delta)
                .map_err(Self::map_openai_error)
        })))
    }

    fn build_request(
        &self,
        prompt: &ChatPrompt,
        options: &CompletionOptions,
    ) -> Result<CreateChatCompletionRequest> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt.system.as_str())
                .build()
                .map_err(|error| HavenError::Validation(format!("Invalid system prompt: {error}")))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.user.as_str())
                .build()
                .map_err(|error| HavenError::Validation(format!("Invalid user prompt: {error}")))?
                .into(),
        ];

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(self.config.model.clone())
            .messages(messages)
            .stream(true);

        if let Some(temperature) = options.temperature {
            request.temperature(temperature);
        }

        if let Some(max_tokens) = options.max_tokens {
            request.max_tokens(max_tokens);
        }

        request.build().map_err(|error| {
            HavenError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }

    fn extract_delta(response: CreateChatCompletionStreamResponse) -> String {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .unwrap_or_default()
    }

    fn map_openai_error(error: OpenAIError) -> HavenError {
        match error {
            OpenAIError::Reqwest(reqwest_error) => {
                HavenError::Llm(format!("LLM request failed: {reqwest_error}"))
            }
            OpenAIError::ApiError(api_error) => {
                HavenError::Llm(format!("LLM API error: {api_error}"))
            }
            OpenAIError::JSONDeserialize(err) => {
                HavenError::Llm(format!("Failed to parse LLM response: {err}"))
            }
            OpenAIError::StreamError(message) => {
                HavenError::Llm(format!("LLM stream error: {message}"))
            }
            OpenAIError::InvalidArgument(message) => HavenError::Validation(message),
            other => HavenError::Llm(other.to_string()),
        }
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
        }
    }
}
