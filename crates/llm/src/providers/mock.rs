//! Mock chat provider.
//!
//! Returns a fixed reply and remembers every conversation it was asked to
//! continue. Used for local development without a model server and in tests.

use crate::client::{ChatClient, ChatReply, LlmUsage};
use crate::types::ChatMessage;
use assist_core::{AppError, AppResult, SamplingConfig};
use std::sync::Mutex;

/// Reply used when the mock is created by the factory.
pub const DEFAULT_MOCK_REPLY: &str = "This is a mock answer.";

#[derive(Debug)]
pub struct MockChatClient {
    reply: Result<String, String>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatClient {
    /// Mock that always answers with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Mock whose every call fails with an `AppError::Llm`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Conversations received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_REPLY)
    }
}

#[async_trait::async_trait]
impl ChatClient for MockChatClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _sampling: &SamplingConfig,
    ) -> AppResult<ChatReply> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }

        let content = self.reply.clone().map_err(AppError::Llm)?;
        let prompt_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();

        Ok(ChatReply {
            usage: LlmUsage::new(prompt_chars as u32, content.chars().count() as u32),
            content,
            model: self.model_name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_requests() {
        let client = MockChatClient::new("ok");
        let messages = vec![ChatMessage::user("first")];

        let reply = client
            .chat(&messages, &SamplingConfig::default())
            .await
            .unwrap();

        assert_eq!(reply.content, "ok");
        assert_eq!(client.requests(), vec![messages]);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let client = MockChatClient::failing("model unavailable");
        let result = client
            .chat(&[ChatMessage::user("q")], &SamplingConfig::default())
            .await;

        match result {
            Err(AppError::Llm(message)) => assert_eq!(message, "model unavailable"),
            other => panic!("Expected LLM error, got {:?}", other),
        }
    }
}
