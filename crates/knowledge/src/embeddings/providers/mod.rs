//! Embedding provider implementations.

pub mod hashing;
pub mod onnx;

pub use hashing::HashingProvider;
pub use onnx::OnnxProvider;
