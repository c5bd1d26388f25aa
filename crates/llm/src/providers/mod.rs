//! Chat model providers.

pub mod mock;
pub mod ollama;

pub use mock::MockChatClient;
pub use ollama::OllamaChatClient;
