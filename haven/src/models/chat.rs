use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserLocation;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Free-text question from the user.
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
    /// Browser geolocation, when the user granted it.
    #[serde(default)]
    pub user_location: Option<UserLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of a conversation. Conversations live in the browser only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// The two messages sent to the chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}
