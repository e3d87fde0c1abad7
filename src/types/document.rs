//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A document that has been indexed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Path relative to the source directory
    pub path: String,
    /// Content hash for change detection
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Filesystem modification time
    pub modified: DateTime<Utc>,
    /// Number of chunks created from this document
    pub total_chunks: u32,
    /// Indexing timestamp
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(
        path: String,
        content_hash: String,
        file_size: u64,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            content_hash,
            file_size,
            modified,
            total_chunks: 0,
            indexed_at: Utc::now(),
        }
    }
}

/// A chunk of text from a document, with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Embedding vector (empty until embedded)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Character range in the original document
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    /// Create a new chunk without an embedding
    pub fn new(
        document_id: Uuid,
        content: String,
        chunk_index: u32,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            embedding: Vec::new(),
            chunk_index,
            char_start,
            char_end,
        }
    }
}
