//! Chat API Endpoints
//! Mission: Relay user messages and serve paginated history

use crate::auth::models::AuthedUser;
use crate::chat::client::build_context;
use crate::chat::models::{ChatRequest, HistoryQuery, HistoryResponse, Message};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::warn;

const CONTEXT_WINDOW_MESSAGES: usize = 10;
const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Send a message to the chatbot - POST /api/chat
pub async fn send_message(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedUser>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<Message>, ChatApiError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ChatApiError::EmptyContent);
    }

    let client = state.chat.as_ref().ok_or(ChatApiError::NotConfigured)?;

    // Context is assembled from history *before* the new message is stored,
    // so the window holds the previous ten exchanges plus this one.
    let history = state
        .messages
        .recent_for_user(&authed.user.id, CONTEXT_WINDOW_MESSAGES)
        .map_err(|_| ChatApiError::InternalError)?;
    let context = build_context(&history, content);

    let mut message = state
        .messages
        .create(&authed.user.id, content)
        .map_err(|_| ChatApiError::InternalError)?;

    let response = client.complete(context).await.map_err(|e| {
        warn!("Chat relay failed for {}: {}", authed.user.email, e);
        ChatApiError::Upstream(e.to_string())
    })?;

    state
        .messages
        .set_response(message.id, &response)
        .map_err(|_| ChatApiError::InternalError)?;
    message.response = Some(response);

    Ok(Json(message))
}

/// Paginated chat history - GET /api/chat/history
pub async fn chat_history(
    State(state): State<AppState>,
    Extension(authed): Extension<AuthedUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ChatApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * page_size;

    let count = state
        .messages
        .count_for_user(&authed.user.id)
        .map_err(|_| ChatApiError::InternalError)?;
    let results = state
        .messages
        .history(&authed.user.id, page_size, offset)
        .map_err(|_| ChatApiError::InternalError)?;

    Ok(Json(HistoryResponse {
        count,
        page,
        page_size,
        results,
    }))
}

/// Chat API errors
#[derive(Debug)]
pub enum ChatApiError {
    EmptyContent,
    NotConfigured,
    Upstream(String),
    InternalError,
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ChatApiError::EmptyContent => {
                (StatusCode::BAD_REQUEST, "Message content is required".to_string())
            }
            ChatApiError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Chat service not configured".to_string(),
            ),
            ChatApiError::Upstream(reason) => (
                StatusCode::BAD_GATEWAY,
                format!("Chat service error: {reason}"),
            ),
            ChatApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
