//! Retrieval pipeline for the assistant backend.
//!
//! Embeds queries with a local encoder, searches a document store by cosine
//! distance, selects informative documents and assembles the conversation
//! answered by the chat model.

pub mod embeddings;
pub mod rag;
pub mod selection;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use rag::{AssistOptions, Assistant};
pub use selection::select;
pub use store::{create_store, DocumentStore, DocumentStream};
pub use types::{AnswerResult, DocumentRecord};
