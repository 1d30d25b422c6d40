use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::AppState;
use crate::error::{HavenError, Result};
use crate::models::ChatRequest;
use crate::services::ChatReply;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const NO_CACHE: &str = "no-cache, no-transform";

/// `POST /api/chat`
///
/// Answers with plain text. Greetings and repeated questions get a complete
/// body; everything else streams the model's answer as it is generated.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant answer, possibly streamed", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid request body"),
        (status = 500, description = "Embedding, search or model failure"),
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Response> {
    request
        .validate()
        .map_err(|e| HavenError::Validation(e.to_string()))?;
    tracing::info!(
        query = %request.query,
        has_location = request.user_location.is_some(),
        "Chat request"
    );

    let body = match state.chat.respond(&request).await? {
        ChatReply::Text(text) => Body::from(text),
        ChatReply::Stream(stream) => Body::from_stream(stream.map(Ok::<_, Infallible>)),
    };

    Ok(plain_text(body))
}

fn plain_text(body: Body) -> Response {
    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    response
}
