use std::sync::Arc;

use crate::cache::KvCache;
use crate::config::Config;
use crate::embeddings::Embedder;
use crate::llm::ChatModel;
use crate::policy::ShelterPolicy;
use crate::search::ShelterIndex;
use crate::services::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(
        config: Config,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn ShelterIndex>,
        model: Arc<dyn ChatModel>,
        cache: Arc<dyn KvCache>,
        policy: Arc<dyn ShelterPolicy>,
    ) -> Self {
        let config = Arc::new(config);
        let chat = ChatService::new(embedder, index, model, cache, policy, &config);

        Self { config, chat }
    }
}
