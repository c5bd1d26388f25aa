//! Chat client abstraction and the generation step.
//!
//! This module defines the provider-agnostic interface to a conversational
//! generation model and the `generate` operation built on top of it.

use crate::types::{ChatMessage, Conversation};
use assist_core::{AppError, AppResult, SamplingConfig};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Reply produced by a chat model for one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// The generated text
    pub content: String,

    /// Model that generated the reply
    pub model: String,

    /// Usage statistics
    #[serde(default)]
    pub usage: LlmUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for generation model providers.
///
/// Implementations are created once at startup and shared between requests,
/// so they must be safe to call concurrently.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "mock").
    fn provider_name(&self) -> &str;

    /// Get the model identifier.
    fn model_name(&self) -> &str;

    /// Generate a reply for the given messages.
    async fn chat(&self, messages: &[ChatMessage], sampling: &SamplingConfig)
        -> AppResult<ChatReply>;

    /// Acquire the model before the first request (e.g. load weights into memory).
    async fn load(&self) -> AppResult<()> {
        Ok(())
    }

    /// Release the model at shutdown.
    async fn release(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Run the generation model on a conversation.
///
/// Returns the input conversation with exactly one assistant message appended;
/// its content is the answer surfaced to the caller.
pub async fn generate(
    client: &dyn ChatClient,
    mut conversation: Conversation,
    sampling: &SamplingConfig,
) -> AppResult<Conversation> {
    if conversation.is_empty() {
        return Err(AppError::Llm("Cannot generate a reply for an empty conversation".to_string()));
    }

    tracing::debug!(
        "Generating reply with {} (model: {}, messages: {})",
        client.provider_name(),
        client.model_name(),
        conversation.len()
    );

    let start = Instant::now();
    let reply = client.chat(conversation.messages(), sampling).await?;

    tracing::info!(
        "Generated {} chars in {:.2}s (prompt tokens: {}, completion tokens: {})",
        reply.content.len(),
        start.elapsed().as_secs_f64(),
        reply.usage.prompt_tokens,
        reply.usage.completion_tokens
    );

    conversation.push(ChatMessage::assistant(reply.content));
    Ok(conversation)
}
