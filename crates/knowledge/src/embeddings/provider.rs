//! Embedding provider trait and factory.

use super::providers::{HashingProvider, OnnxProvider};
use assist_core::config::EmbeddingSettings;
use assist_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Dimensions of the hashing provider when none are configured.
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "onnx", "hashing")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    ///
    /// Returns one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// The `onnx` provider loads the model directory eagerly, so a missing or
/// broken model fails here rather than on the first request.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "onnx" => {
            let provider = OnnxProvider::load(
                Path::new(&settings.model),
                settings.max_length,
                settings.normalize,
            )?;

            if let Some(expected) = settings.dimensions {
                if provider.dimensions() != expected {
                    return Err(AppError::Embedding(format!(
                        "Model '{}' produces {} dimensions but {} are configured",
                        settings.model,
                        provider.dimensions(),
                        expected
                    )));
                }
            }

            Ok(Arc::new(provider))
        }

        "hashing" => {
            let provider = HashingProvider::new(
                settings.dimensions.unwrap_or(DEFAULT_HASHING_DIMENSIONS),
                settings.max_length,
                settings.normalize,
            );
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Embedding(format!(
            "Unknown embedding provider: '{}'. Supported providers: onnx, hashing",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashing_settings() -> EmbeddingSettings {
        EmbeddingSettings {
            provider: "hashing".to_string(),
            dimensions: Some(64),
            ..EmbeddingSettings::default()
        }
    }

    #[test]
    fn test_create_hashing_provider() {
        let provider = create_provider(&hashing_settings()).unwrap();
        assert_eq!(provider.provider_name(), "hashing");
        assert_eq!(provider.dimensions(), 64);
    }

    #[test]
    fn test_create_unknown_provider() {
        let settings = EmbeddingSettings {
            provider: "unknown".to_string(),
            ..EmbeddingSettings::default()
        };

        let err = create_provider(&settings).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_onnx_provider_missing_model_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let settings = EmbeddingSettings {
            provider: "onnx".to_string(),
            model: temp.path().join("missing").to_string_lossy().to_string(),
            ..EmbeddingSettings::default()
        };

        assert!(matches!(
            create_provider(&settings),
            Err(AppError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&hashing_settings()).unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }
}
