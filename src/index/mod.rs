//! SQLite-backed chunk index with embedding storage and cosine search
//!
//! Chunks and their embedding vectors are persisted in a single SQLite
//! database. Search is an exact cosine scan over the stored vectors.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};
use chrono::{DateTime, TimeZone, Utc};

/// Search result: a chunk with its source path and similarity score
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Document path relative to the source directory
    pub path: String,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Chunk text
    pub content: String,
    /// Cosine similarity (0.0-1.0 for normalized embeddings)
    pub similarity: f32,
}

/// Persistent chunk index
pub struct ChunkIndex {
    conn: Arc<Mutex<Connection>>,
}

impl ChunkIndex {
    /// Create or open the index database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Index(format!("Failed to open index database: {}", e)))?;

        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        index.migrate()?;
        Ok(index)
    }

    /// Create an in-memory index (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Index(format!("Failed to open in-memory database: {}", e)))?;

        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        index.migrate()?;
        Ok(index)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#,
        )
        .map_err(|e| Error::Index(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                content_hash TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                modified_ms INTEGER NOT NULL,
                total_chunks INTEGER NOT NULL DEFAULT 0,
                indexed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_path ON documents(path);

            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                char_start INTEGER NOT NULL,
                char_end INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_document_id ON chunks(document_id);
        "#,
        )
        .map_err(|e| Error::Index(format!("Failed to run migrations: {}", e)))?;

        Ok(())
    }

    /// Insert a document record
    pub fn insert_document(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (id, path, content_hash, file_size, modified_ms, total_chunks, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(path) DO UPDATE SET
                id = excluded.id,
                content_hash = excluded.content_hash,
                file_size = excluded.file_size,
                modified_ms = excluded.modified_ms,
                total_chunks = excluded.total_chunks,
                indexed_at = excluded.indexed_at
            "#,
            params![
                doc.id.to_string(),
                doc.path,
                doc.content_hash,
                doc.file_size as i64,
                doc.modified.timestamp_millis(),
                doc.total_chunks as i64,
                doc.indexed_at,
            ],
        )
        .map_err(|e| Error::Index(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    /// Insert chunks in a single transaction
    pub fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let mut conn = self.conn.lock();

        let tx = conn
            .transaction()
            .map_err(|e| Error::Index(format!("Failed to begin transaction: {}", e)))?;

        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::Index(format!(
                    "Chunk {} has no embedding",
                    chunk.id
                )));
            }

            tx.execute(
                r#"
                INSERT INTO chunks (id, document_id, chunk_index, content, char_start, char_end, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.document_id.to_string(),
                    chunk.chunk_index as i64,
                    chunk.content,
                    chunk.char_start as i64,
                    chunk.char_end as i64,
                    embedding_to_blob(&chunk.embedding),
                ],
            )
            .map_err(|e| Error::Index(format!("Failed to insert chunk: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| Error::Index(format!("Failed to commit chunks: {}", e)))?;

        Ok(())
    }

    /// Remove every chunk and document; returns the number of chunks deleted
    pub fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let deleted = conn
            .execute("DELETE FROM chunks", [])
            .map_err(|e| Error::Index(format!("Failed to delete chunks: {}", e)))?;

        conn.execute("DELETE FROM documents", [])
            .map_err(|e| Error::Index(format!("Failed to delete documents: {}", e)))?;

        Ok(deleted)
    }

    /// Modification times of indexed documents, keyed by relative path
    pub fn document_mtimes(&self) -> Result<HashMap<String, i64>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT path, modified_ms FROM documents")
            .map_err(|e| Error::Index(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let path: String = row.get(0)?;
                let modified_ms: i64 = row.get(1)?;
                Ok((path, modified_ms))
            })
            .map_err(|e| Error::Index(e.to_string()))?;

        let mut mtimes = HashMap::new();
        for row in rows {
            let (path, modified_ms) = row.map_err(|e| Error::Index(e.to_string()))?;
            mtimes.insert(path, modified_ms);
        }

        Ok(mtimes)
    }

    /// List all indexed documents
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, path, content_hash, file_size, modified_ms, total_chunks, indexed_at
                FROM documents ORDER BY path
                "#,
            )
            .map_err(|e| Error::Index(e.to_string()))?;

        let rows = stmt
            .query_map([], row_to_document)
            .map_err(|e| Error::Index(e.to_string()))?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(row.map_err(|e| Error::Index(e.to_string()))?);
        }

        Ok(documents)
    }

    /// Number of stored chunks
    pub fn chunk_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| Error::Index(e.to_string()))?;
        Ok(count as usize)
    }

    /// Number of stored documents
    pub fn document_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Index(e.to_string()))?;
        Ok(count as usize)
    }

    /// Check if the index holds no chunks
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.chunk_count()? == 0)
    }

    /// Cosine-similarity search over stored chunk embeddings
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT d.path, c.chunk_index, c.content, c.embedding
                FROM chunks c
                JOIN documents d ON d.id = c.document_id
                "#,
            )
            .map_err(|e| Error::Index(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let path: String = row.get(0)?;
                let chunk_index: i64 = row.get(1)?;
                let content: String = row.get(2)?;
                let blob: Vec<u8> = row.get(3)?;
                Ok((path, chunk_index as u32, content, blob))
            })
            .map_err(|e| Error::Index(e.to_string()))?;

        let mut results = Vec::new();

        for row in rows {
            let (path, chunk_index, content, blob) =
                row.map_err(|e| Error::Index(e.to_string()))?;
            let embedding = blob_to_embedding(&blob);

            if embedding.len() != query_embedding.len() {
                tracing::warn!(
                    "Skipping chunk with mismatched embedding dimensions ({} vs {})",
                    embedding.len(),
                    query_embedding.len()
                );
                continue;
            }

            let similarity = cosine_similarity(query_embedding, &embedding);
            results.push(SearchResult {
                path,
                chunk_index,
                content,
                similarity,
            });
        }

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let id_str: String = row.get(0)?;
    let path: String = row.get(1)?;
    let content_hash: String = row.get(2)?;
    let file_size: i64 = row.get(3)?;
    let modified_ms: i64 = row.get(4)?;
    let total_chunks: i64 = row.get(5)?;
    let indexed_at: DateTime<Utc> = row.get(6)?;

    Ok(Document {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        path,
        content_hash,
        file_size: file_size as u64,
        modified: Utc
            .timestamp_millis_opt(modified_ms)
            .single()
            .unwrap_or_else(Utc::now),
        total_chunks: total_chunks as u32,
        indexed_at,
    })
}

/// Encode an embedding vector as little-endian f32 bytes
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Decode little-endian f32 bytes back into an embedding vector
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn document(path: &str) -> Document {
        Document::new(path.to_string(), "hash".to_string(), 100, Utc::now())
    }

    fn chunk(document_id: Uuid, content: &str, index: u32, embedding: Vec<f32>) -> Chunk {
        let mut chunk = Chunk::new(document_id, content.to_string(), index, 0, content.len());
        chunk.embedding = embedding;
        chunk
    }

    #[test]
    fn embedding_blob_round_trip() {
        let embedding = vec![0.25f32, -1.5, 3.75, 0.0];
        let decoded = blob_to_embedding(&embedding_to_blob(&embedding));
        assert_eq!(decoded, embedding);
    }

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![0.6f32, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn insert_and_count() {
        let index = ChunkIndex::in_memory().unwrap();
        let doc = document("a.md");

        index.insert_document(&doc).unwrap();
        index
            .insert_chunks(&[
                chunk(doc.id, "first", 0, vec![1.0, 0.0]),
                chunk(doc.id, "second", 1, vec![0.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(index.document_count().unwrap(), 1);
        assert_eq!(index.chunk_count().unwrap(), 2);
        assert!(!index.is_empty().unwrap());
    }

    #[test]
    fn chunks_without_embeddings_are_rejected() {
        let index = ChunkIndex::in_memory().unwrap();
        let doc = document("a.md");
        index.insert_document(&doc).unwrap();

        let bare = Chunk::new(doc.id, "no embedding".to_string(), 0, 0, 12);
        assert!(index.insert_chunks(&[bare]).is_err());
    }

    #[test]
    fn search_ranks_by_cosine_similarity() {
        let index = ChunkIndex::in_memory().unwrap();
        let doc = document("notes.txt");
        index.insert_document(&doc).unwrap();
        index
            .insert_chunks(&[
                chunk(doc.id, "close match", 0, vec![0.9, 0.1]),
                chunk(doc.id, "exact match", 1, vec![1.0, 0.0]),
                chunk(doc.id, "far away", 2, vec![0.0, 1.0]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "exact match");
        assert_eq!(results[1].content, "close match");
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn search_on_empty_index_returns_nothing() {
        let index = ChunkIndex::in_memory().unwrap();
        assert!(index.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let index = ChunkIndex::in_memory().unwrap();
        let doc = document("a.md");
        index.insert_document(&doc).unwrap();
        index
            .insert_chunks(&[chunk(doc.id, "content", 0, vec![1.0])])
            .unwrap();

        let deleted = index.clear().unwrap();
        assert_eq!(deleted, 1);
        assert!(index.is_empty().unwrap());
        assert_eq!(index.document_count().unwrap(), 0);
    }

    #[test]
    fn document_mtimes_round_trip() {
        let index = ChunkIndex::in_memory().unwrap();
        let doc = document("a.md");
        index.insert_document(&doc).unwrap();

        let mtimes = index.document_mtimes().unwrap();
        assert_eq!(mtimes.len(), 1);
        assert_eq!(mtimes["a.md"], doc.modified.timestamp_millis());
    }

    #[test]
    fn reinserting_a_path_replaces_the_document_row() {
        let index = ChunkIndex::in_memory().unwrap();
        index.insert_document(&document("a.md")).unwrap();

        let mut updated = document("a.md");
        updated.content_hash = "newhash".to_string();
        index.insert_document(&updated).unwrap();

        let docs = index.list_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content_hash, "newhash");
    }
}
