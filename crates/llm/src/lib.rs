//! Generation model integration for the assistant backend.
//!
//! This crate provides the conversation types exchanged with a conversational
//! model and a provider-agnostic client trait used by the generation step.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime
//! - **Mock**: Fixed replies for development and tests
//!
//! # Example
//! ```no_run
//! use assist_llm::{generate, ChatMessage, Conversation, SamplingConfig};
//! use assist_llm::providers::MockChatClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MockChatClient::new("Hello!");
//! let conversation = Conversation::new().with_message(ChatMessage::user("Hi"));
//! let conversation = generate(&client, conversation, &SamplingConfig::default()).await?;
//! println!("{}", conversation.reply().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use assist_core::SamplingConfig;
pub use client::{generate, ChatClient, ChatReply, LlmUsage};
pub use factory::create_client;
pub use providers::{MockChatClient, OllamaChatClient};
pub use types::{ChatMessage, Conversation, Role};
