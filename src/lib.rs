//! askdocs: document Q&A service with a web chat UI
//!
//! Indexes a local corpus of text documents into a SQLite-backed chunk index
//! with locally-generated ONNX embeddings, answers questions over the top
//! retrieved chunks through an LLM, and serves the static chat frontend that
//! drives it all.

pub mod config;
pub mod corpus;
pub mod error;
pub mod generation;
pub mod index;
pub mod providers;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::{
    api::{AskRequest, AskResponse, DocumentListResponse, OpResponse},
    document::{Chunk, Document},
};
