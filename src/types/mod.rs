//! Core types for the Q&A service

pub mod api;
pub mod document;

pub use api::{AskRequest, AskResponse, DocumentListResponse, OpResponse, UpdateDatabaseRequest};
pub use document::{Chunk, Document};
