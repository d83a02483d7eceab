//! Chat Models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user message and, once the relay has answered, its response.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: i64,
    pub user_id: Uuid,
    pub content: String,
    pub response: Option<String>,
    pub timestamp: String,
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub content: String,
}

/// History pagination query
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Paginated chat history
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: i64,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<Message>,
}
