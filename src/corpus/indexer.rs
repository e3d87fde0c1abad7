//! Corpus indexing: scan, chunk, embed, store

use sha2::{Digest, Sha256};

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::index::ChunkIndex;
use crate::providers::EmbeddingProvider;
use crate::types::Document;

use super::chunker::TextChunker;
use super::scanner::{read_source_file, SourceScanner};

/// Outcome of an index build
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildSummary {
    /// Documents indexed
    pub documents: usize,
    /// Chunks created
    pub chunks: usize,
}

/// Builds and refreshes the chunk index from the source corpus
pub struct Indexer<'a> {
    index: &'a ChunkIndex,
    embedder: &'a dyn EmbeddingProvider,
    chunker: TextChunker,
}

impl<'a> Indexer<'a> {
    /// Create an indexer over the given index and embedder
    pub fn new(
        index: &'a ChunkIndex,
        embedder: &'a dyn EmbeddingProvider,
        chunking: &ChunkingConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            chunker: TextChunker::from_config(chunking),
        }
    }

    /// Rebuild the index from scratch for the scanner's source directory
    pub async fn rebuild(&self, scanner: &SourceScanner) -> Result<BuildSummary> {
        let files = scanner.scan()?;

        tracing::info!(
            "Rebuilding index from {} ({} files)",
            scanner.root().display(),
            files.len()
        );

        self.index.clear()?;

        let mut summary = BuildSummary::default();

        for file in &files {
            let content = match read_source_file(file) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Skipping {}: {}", file.relative, e);
                    continue;
                }
            };

            let mut doc = Document::new(
                file.relative.clone(),
                content_hash(&content),
                file.size,
                file.modified,
            );

            let mut chunks = self.chunker.chunk_text(doc.id, &content);
            if chunks.is_empty() {
                tracing::debug!("No chunks produced for {}", file.relative);
                continue;
            }

            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }

            doc.total_chunks = chunks.len() as u32;
            self.index.insert_document(&doc)?;
            self.index.insert_chunks(&chunks)?;

            tracing::info!("Indexed {} ({} chunks)", file.relative, chunks.len());

            summary.documents += 1;
            summary.chunks += chunks.len();
        }

        tracing::info!(
            "Index rebuilt: {} documents, {} chunks",
            summary.documents,
            summary.chunks
        );

        Ok(summary)
    }

    /// Rebuild only when the corpus changed since the last build
    ///
    /// Compares stored per-file modification times against the filesystem.
    /// Returns true when a rebuild was performed.
    pub async fn sync_if_stale(&self, scanner: &SourceScanner) -> Result<bool> {
        let files = scanner.scan()?;
        let stored = self.index.document_mtimes()?;

        if files.is_empty() && stored.is_empty() {
            tracing::warn!(
                "No documents found in {}",
                scanner.root().display()
            );
            return Ok(false);
        }

        let mut stale = files.len() != stored.len();

        if !stale {
            for file in &files {
                match stored.get(&file.relative) {
                    Some(&modified_ms) if modified_ms == file.modified.timestamp_millis() => {}
                    _ => {
                        stale = true;
                        break;
                    }
                }
            }
        }

        if stale {
            tracing::info!("Corpus changed since last build, rebuilding index");
            self.rebuild(scanner).await?;
            Ok(true)
        } else {
            tracing::info!("Index is up to date, no rebuild needed");
            Ok(false)
        }
    }
}

/// SHA-256 hash of document content
fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    /// Deterministic embedder stub: a fixed-dimension character histogram
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 8];
            for b in text.bytes() {
                v[(b % 8) as usize] += 1.0;
            }
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            8
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn chunking() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 40,
            min_chunk_size: 10,
        }
    }

    fn scanner(dir: &TempDir) -> SourceScanner {
        SourceScanner::new(dir.path().to_path_buf(), vec!["md".into(), "txt".into()])
    }

    #[tokio::test]
    async fn rebuild_indexes_every_document() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "Alpha document content here. ".repeat(5)).unwrap();
        fs::write(dir.path().join("b.txt"), "Beta document content here. ".repeat(5)).unwrap();

        let index = ChunkIndex::in_memory().unwrap();
        let embedder = StubEmbedder;
        let indexer = Indexer::new(&index, &embedder, &chunking());

        let summary = indexer.rebuild(&scanner(&dir)).await.unwrap();
        assert_eq!(summary.documents, 2);
        assert!(summary.chunks >= 2);
        assert_eq!(index.document_count().unwrap(), 2);
        assert_eq!(index.chunk_count().unwrap(), summary.chunks);
    }

    #[tokio::test]
    async fn rebuild_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "Original content goes here. ".repeat(5)).unwrap();

        let index = ChunkIndex::in_memory().unwrap();
        let embedder = StubEmbedder;
        let indexer = Indexer::new(&index, &embedder, &chunking());

        indexer.rebuild(&scanner(&dir)).await.unwrap();
        let first_count = index.chunk_count().unwrap();

        indexer.rebuild(&scanner(&dir)).await.unwrap();
        assert_eq!(index.chunk_count().unwrap(), first_count);
        assert_eq!(index.document_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn rebuild_with_empty_corpus_reports_zero_documents() {
        let dir = TempDir::new().unwrap();

        let index = ChunkIndex::in_memory().unwrap();
        let embedder = StubEmbedder;
        let indexer = Indexer::new(&index, &embedder, &chunking());

        let summary = indexer.rebuild(&scanner(&dir)).await.unwrap();
        assert_eq!(summary.documents, 0);
        assert_eq!(summary.chunks, 0);
    }

    #[tokio::test]
    async fn sync_builds_a_missing_index() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "Some document content here. ".repeat(5)).unwrap();

        let index = ChunkIndex::in_memory().unwrap();
        let embedder = StubEmbedder;
        let indexer = Indexer::new(&index, &embedder, &chunking());

        let rebuilt = indexer.sync_if_stale(&scanner(&dir)).await.unwrap();
        assert!(rebuilt);
        assert_eq!(index.document_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn sync_skips_an_up_to_date_index() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "Some document content here. ".repeat(5)).unwrap();

        let index = ChunkIndex::in_memory().unwrap();
        let embedder = StubEmbedder;
        let indexer = Indexer::new(&index, &embedder, &chunking());

        indexer.rebuild(&scanner(&dir)).await.unwrap();
        let rebuilt = indexer.sync_if_stale(&scanner(&dir)).await.unwrap();
        assert!(!rebuilt);
    }

    #[tokio::test]
    async fn sync_detects_added_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "Some document content here. ".repeat(5)).unwrap();

        let index = ChunkIndex::in_memory().unwrap();
        let embedder = StubEmbedder;
        let indexer = Indexer::new(&index, &embedder, &chunking());

        indexer.rebuild(&scanner(&dir)).await.unwrap();

        fs::write(dir.path().join("b.md"), "A second document appears. ".repeat(5)).unwrap();
        let rebuilt = indexer.sync_if_stale(&scanner(&dir)).await.unwrap();
        assert!(rebuilt);
        assert_eq!(index.document_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn sync_detects_removed_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.md");
        fs::write(&a, "First document content here. ".repeat(5)).unwrap();
        fs::write(dir.path().join("b.md"), "Second document content here. ".repeat(5)).unwrap();

        let index = ChunkIndex::in_memory().unwrap();
        let embedder = StubEmbedder;
        let indexer = Indexer::new(&index, &embedder, &chunking());

        indexer.rebuild(&scanner(&dir)).await.unwrap();
        fs::remove_file(&a).unwrap();

        let rebuilt = indexer.sync_if_stale(&scanner(&dir)).await.unwrap();
        assert!(rebuilt);
        assert_eq!(index.document_count().unwrap(), 1);
    }
}
