use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub embeddings: EmbeddingsStatus,
    pub vector_store: VectorStoreStatus,
    pub llm: LlmStatus,
    pub cache: CacheStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EmbeddingsStatus {
    pub model: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct VectorStoreStatus {
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CacheStatus {
    pub backend: String,
}

/// `GET /api/health`
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    let model = state.chat.chat_model();
    let llm = if model.is_available() {
        LlmStatus {
            status: "available".to_string(),
            provider: Some(model.backend_name().to_string()),
            model: model.model_name().map(str::to_string),
        }
    } else {
        LlmStatus {
            status: "unavailable".to_string(),
            provider: None,
            model: None,
        }
    };

    Json(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        embeddings: EmbeddingsStatus {
            model: state.chat.embeddings_model().to_string(),
        },
        vector_store: VectorStoreStatus {
            collection: state.chat.collection().to_string(),
        },
        llm,
        cache: CacheStatus {
            backend: state.chat.cache_backend().to_string(),
        },
    })
}
