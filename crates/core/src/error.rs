//! Error types for the assistant backend.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, embedding, document storage,
//! generation, prompt rendering and serialization.

use thiserror::Error;

/// Unified error type for the assistant backend.
///
/// All fallible functions return `Result<T, AppError>`.
/// Library code never panics; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoder loading and inference errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Document store connectivity and query errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generation model errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt loading and rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error came from an external dependency of a request
    /// (encoder, document store, generation model or prompt rendering).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Embedding(_) | AppError::Storage(_) | AppError::Llm(_) | AppError::Prompt(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        assert!(AppError::Storage("down".to_string()).is_upstream());
        assert!(AppError::Llm("timeout".to_string()).is_upstream());
        assert!(!AppError::Config("bad".to_string()).is_upstream());
    }

    #[test]
    fn test_display_prefixes() {
        let err = AppError::Embedding("model.onnx missing".to_string());
        assert_eq!(err.to_string(), "Embedding error: model.onnx missing");
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
