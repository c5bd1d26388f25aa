//! Chat client factory.
//!
//! Creates the generation client named by the chat settings.

use crate::client::ChatClient;
use crate::providers::{MockChatClient, OllamaChatClient};
use assist_core::config::ChatSettings;
use assist_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a chat client based on the configured provider.
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - The model identifier is missing for a real provider
/// - Client initialization fails
pub fn create_client(settings: &ChatSettings) -> AppResult<Arc<dyn ChatClient>> {
    match settings.provider.to_lowercase().as_str() {
        "ollama" => {
            if settings.model.trim().is_empty() {
                return Err(AppError::Config(
                    "Ollama provider requires a model name".to_string(),
                ));
            }
            Ok(Arc::new(OllamaChatClient::new(settings)?))
        }
        "mock" => Ok(Arc::new(MockChatClient::default())),
        other => Err(AppError::Config(format!(
            "Unknown chat provider: {}. Supported: ollama, mock",
            other
        ))),
    }
}
