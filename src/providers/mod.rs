//! Provider abstractions for embeddings and answer generation
//!
//! Trait seams keep the HTTP layer independent of the concrete embedding
//! runtime and LLM backend, and let tests substitute deterministic stubs.

pub mod embedding;
pub mod llm;
pub mod onnx;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use onnx::OnnxEmbedder;
