//! Chat Completion Client
//! Mission: Relay conversations to an OpenAI-compatible completions API

use crate::chat::models::Message;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// System prompt framing every relayed conversation.
pub const CHAT_PROMPT: &str = r#"
You are an expert, compassionate, and highly skilled board-certified psychiatrist with over 25 years of clinical experience specializing in multiple mental health disorders. Your communication style is:

1. Empathetic and non-judgmental
2. Professional yet warm
3. Focused on patient safety and well-being

Core Interaction Guidelines:
- Listen actively and reflectively
- Ask clarifying questions
- Provide evidence-based, personalized guidance
- Never diagnose definitively through chat
- Prioritize patient's emotional safety
- Recognize crisis situations

Interaction Framework:
1. First Response:
- Validate user's feelings
- Establish psychological safety
- Ask open-ended exploratory questions

2. Assessment Approach:
- Use trauma-informed, person-centered communication
- Screen for immediate risk factors
- Understand context and emotional nuances
- Avoid direct medical diagnosis

3. Guidance Strategies:
- Offer coping mechanisms
- Suggest professional consultation
- Provide psychoeducational resources
- Recommend appropriate support systems

4. Crisis Protocol:
- Immediately recognize signs of acute distress
- Provide immediate crisis intervention resources
- Maintain calm, supportive tone

Recommended Response Structure:
[Empathetic Acknowledgment]
[Clarifying Question]
[Supportive Guidance]
"#;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Build the completion context: system prompt, then the stored exchanges in
/// chronological order, then the new message. `history` arrives newest first,
/// as the store returns it.
pub fn build_context(history: &[Message], content: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::new("system", CHAT_PROMPT.trim())];

    for msg in history.iter().rev() {
        messages.push(ChatMessage::new("user", &msg.content));
        if let Some(response) = &msg.response {
            messages.push(ChatMessage::new("assistant", response));
        }
    }

    messages.push(ChatMessage::new("user", content));
    messages
}

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, api_key: String, base_url: String, model: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
            model,
        }
    }

    /// Request one completion for the assembled context.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
        };

        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let resp = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&req)
            .send()
            .await
            .context("chat completion request")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let snippet: String = body.chars().take(800).collect();
            return Err(anyhow!("chat api {}: {}", status.as_u16(), snippet));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).context("chat api json parse")?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.clone())
            .ok_or_else(|| anyhow!("chat api returned no choices"))?;

        debug!("Chat completion received ({} chars)", content.len());

        Ok(content)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    pub message: Option<ChatMessageOut>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageOut {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn message(id: i64, content: &str, response: Option<&str>) -> Message {
        Message {
            id,
            user_id: Uuid::new_v4(),
            content: content.to_string(),
            response: response.map(|s| s.to_string()),
            timestamp: format!("2025-01-01T00:00:{:02}Z", id),
        }
    }

    #[test]
    fn test_context_starts_with_system_prompt() {
        let context = build_context(&[], "hello");
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, "system");
        assert!(context[0].content.contains("board-certified psychiatrist"));
        assert_eq!(context[1].role, "user");
        assert_eq!(context[1].content, "hello");
    }

    #[test]
    fn test_context_replays_history_chronologically() {
        // Store order: newest first.
        let history = vec![
            message(2, "second question", Some("second answer")),
            message(1, "first question", Some("first answer")),
        ];

        let context = build_context(&history, "third question");

        let turns: Vec<(&str, &str)> = context
            .iter()
            .map(|m| (m.role.as_str(), m.content.as_str()))
            .collect();

        assert_eq!(turns[1], ("user", "first question"));
        assert_eq!(turns[2], ("assistant", "first answer"));
        assert_eq!(turns[3], ("user", "second question"));
        assert_eq!(turns[4], ("assistant", "second answer"));
        assert_eq!(turns[5], ("user", "third question"));
    }

    #[test]
    fn test_unanswered_messages_skip_assistant_turn() {
        let history = vec![message(1, "pending question", None)];

        let context = build_context(&history, "next");
        assert_eq!(context.len(), 3);
        assert_eq!(context[1].role, "user");
        assert_eq!(context[2].role, "user");
    }
}
