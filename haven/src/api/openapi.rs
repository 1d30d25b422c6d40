use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Haven API",
        version = "1.0.0",
        description = "Chat assistant that helps people in the Dallas–Fort Worth area find nearby shelters.",
    ),
    paths(
        handlers::chat::chat,
        handlers::health::health_check,
    ),
    components(schemas(
        models::ChatRequest,
        models::UserLocation,
        handlers::health::HealthData,
        handlers::health::EmbeddingsStatus,
        handlers::health::VectorStoreStatus,
        handlers::health::LlmStatus,
        handlers::health::CacheStatus,
    )),
    tags(
        (name = "chat", description = "Shelter-aware chat"),
        (name = "health", description = "Health check"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
