use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};

use crate::cache::{self, KvCache};
use crate::config::{ChatConfig, Config};
use crate::embeddings::{CachedEmbedder, Embedder};
use crate::error::Result;
use crate::llm::prompts::{self, ShelterContext};
use crate::llm::{ChatModel, CompletionOptions};
use crate::models::{ChatPrompt, ChatRequest, ScoredShelter, UserLocation};
use crate::policy::ShelterPolicy;
use crate::search::ShelterIndex;

use super::relay::{relay, RelayStream};
use super::{retrieval, small_talk};

/// What the chat endpoint sends back.
pub enum ChatReply {
    /// A complete answer: small talk or a cached response.
    Text(String),
    /// Live model output.
    Stream(RelayStream),
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatReply::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ChatReply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// The retrieval-augmented chat pipeline.
#[derive(Clone)]
pub struct ChatService {
    embedder: CachedEmbedder,
    index: Arc<dyn ShelterIndex>,
    model: Arc<dyn ChatModel>,
    cache: Arc<dyn KvCache>,
    policy: Arc<dyn ShelterPolicy>,
    settings: ChatConfig,
    response_ttl: Duration,
}

impl ChatService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn ShelterIndex>,
        model: Arc<dyn ChatModel>,
        cache: Arc<dyn KvCache>,
        policy: Arc<dyn ShelterPolicy>,
        config: &Config,
    ) -> Self {
        let embedder = CachedEmbedder::new(
            embedder,
            cache.clone(),
            Duration::from_secs(config.cache.embedding_ttl_secs),
        );

        Self {
            embedder,
            index,
            model,
            cache,
            policy,
            settings: config.chat.clone(),
            response_ttl: Duration::from_secs(config.cache.response_ttl_secs),
        }
    }

    pub fn embeddings_model(&self) -> &str {
        self.embedder.model()
    }

    pub fn collection(&self) -> &str {
        self.index.collection()
    }

    pub fn chat_model(&self) -> &dyn ChatModel {
        self.model.as_ref()
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend_name()
    }

    /// Answer one validated request.
    ///
    /// Small talk and cache hits return a full body. Otherwise the query is
    /// embedded, searched, ranked and turned into a prompt, and the model's
    /// streamed answer is relayed. Failures before the first model fragment
    /// arrives are returned as errors.
    pub async fn respond(&self, request: &ChatRequest) -> Result<ChatReply> {
        let query = request.query.as_str();
        let location = request.user_location;

        if let Some(reply) = small_talk::quick_reply(query) {
            tracing::info!("Small talk, sending quick reply");
            return Ok(ChatReply::Text(reply.to_string()));
        }

        let key = cache::response_key(query, location);
        if let Some(cached) = cache::lookup(self.cache.as_ref(), &key).await {
            tracing::info!("Response cache hit");
            return Ok(ChatReply::Text(cached));
        }

        let vector = self.embedder.embed(query).await?;
        tracing::debug!(dimensions = vector.len(), "Embedding created");

        let hits = self
            .index
            .search(
                &vector,
                self.settings.search_limit,
                self.settings.score_threshold,
            )
            .await?;
        if hits.is_empty() {
            tracing::info!(collection = self.index.collection(), "No shelters found");
        } else {
            tracing::info!(count = hits.len(), "Shelters retrieved");
        }

        let hits = retrieval::rank_by_distance(hits, location);
        let prompt = self.build_prompt(query, location, &hits);

        let options = CompletionOptions {
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
        };
        let mut upstream = self.model.stream_chat(&prompt, &options).await?;

        // Authentication and quota errors surface as the first stream item.
        let first = match upstream.next().await {
            Some(Err(e)) => return Err(e),
            Some(Ok(fragment)) => Some(fragment),
            None => None,
        };
        tracing::info!("Starting streaming response");

        let upstream = Box::pin(stream::iter(first.map(Ok)).chain(upstream));
        Ok(ChatReply::Stream(relay(
            upstream,
            self.cache.clone(),
            key,
            self.response_ttl,
        )))
    }

    /// Assemble the system and user messages for ranked hits.
    pub fn build_prompt(
        &self,
        query: &str,
        location: Option<UserLocation>,
        hits: &[ScoredShelter],
    ) -> ChatPrompt {
        let context = if hits.is_empty() || !self.policy.wants_shelters(query) {
            tracing::debug!("Prompt without shelter context");
            ShelterContext::None
        } else if let Some(focused) = retrieval::find_focused(query, hits) {
            tracing::debug!(shelter = %focused.record.name, "Prompt focused on one shelter");
            ShelterContext::Focused(focused)
        } else {
            tracing::debug!(count = hits.len(), "Prompt with shelter list");
            ShelterContext::List(hits)
        };

        ChatPrompt {
            system: prompts::system_prompt(context, self.policy.as_ref()),
            user: prompts::user_message(query, location),
        }
    }
}
