//! Query embedding.
//!
//! Provides provider-agnostic sentence embeddings: tokenization, an encoder
//! forward pass and masked mean pooling over the token vectors.

pub mod pooling;
pub mod provider;
pub mod providers;

pub use pooling::{l2_normalize, mean_pooling, MASK_EPSILON};
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{HashingProvider, OnnxProvider};
