//! Document stores answering nearest-neighbor queries.
//!
//! Backends:
//! - **clickhouse**: cosine distance computed by ClickHouse, rows streamed over HTTP
//! - **memory**: JSONL file of documents with embeddings, brute-force search

pub mod clickhouse;
pub mod memory;

pub use clickhouse::ClickHouseStore;
pub use memory::MemoryStore;

use crate::types::DocumentRecord;
use assist_core::config::StoreConfig;
use assist_core::{AppError, AppResult};
use futures::stream::{BoxStream, TryStreamExt};
use std::sync::Arc;

/// Rows in ascending distance order, yielded as they are decoded.
pub type DocumentStream = BoxStream<'static, AppResult<DocumentRecord>>;

/// Trait for document stores.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name (e.g., "clickhouse", "memory")
    fn backend_name(&self) -> &str;

    /// Start a search for the documents closest to `vector`.
    ///
    /// The store fetches `limit` plus its configured oversample so that
    /// filtering downstream can still fill `limit` slots.
    async fn search_stream(&self, vector: &[f32], limit: usize) -> AppResult<DocumentStream>;

    /// Run a search and collect every row.
    async fn search(&self, vector: &[f32], limit: usize) -> AppResult<Vec<DocumentRecord>> {
        self.search_stream(vector, limit).await?.try_collect().await
    }
}

/// Create a document store based on configuration.
pub fn create_store(config: &StoreConfig, oversample: usize) -> AppResult<Arc<dyn DocumentStore>> {
    match config.backend.as_str() {
        "clickhouse" => Ok(Arc::new(ClickHouseStore::new(
            &config.clickhouse,
            oversample,
        )?)),

        "memory" => {
            let path = config.documents_path.as_ref().ok_or_else(|| {
                AppError::Config("Memory store requires a documents file".to_string())
            })?;
            Ok(Arc::new(MemoryStore::open(path, oversample)?))
        }

        _ => Err(AppError::Config(format!(
            "Unknown store backend: '{}'. Supported backends: clickhouse, memory",
            config.backend
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_clickhouse_store() {
        let mut config = StoreConfig::default();
        config.clickhouse.table = "documents".to_string();

        let store = create_store(&config, 500).unwrap();
        assert_eq!(store.backend_name(), "clickhouse");
    }

    #[test]
    fn test_memory_store_requires_path() {
        let config = StoreConfig {
            backend: "memory".to_string(),
            documents_path: None,
            ..StoreConfig::default()
        };

        assert!(matches!(create_store(&config, 0), Err(AppError::Config(_))));
    }

    #[test]
    fn test_unknown_backend() {
        let config = StoreConfig {
            backend: "sqlite".to_string(),
            ..StoreConfig::default()
        };

        assert!(create_store(&config, 0).is_err());
    }
}
