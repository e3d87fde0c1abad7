//! Sentence-aware text chunking with overlap

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::types::Chunk;

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize, min_size: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size,
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.min_chunk_size)
    }

    /// Split a document's text into overlapping chunks
    pub fn chunk_text(&self, document_id: Uuid, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        let mut current = String::new();
        let mut current_start = 0usize;
        let mut char_pos = 0usize;
        let mut chunk_index = 0u32;

        for sentence in text.split_sentence_bounds() {
            let sentence_len = sentence.len();

            if !current.is_empty() && current.len() + sentence_len > self.chunk_size {
                if current.len() >= self.min_size {
                    chunks.push(Chunk::new(
                        document_id,
                        current.trim().to_string(),
                        chunk_index,
                        current_start,
                        char_pos,
                    ));
                    chunk_index += 1;
                }

                // Start the next chunk with the tail of the previous one
                let overlap_text = self.overlap_tail(&current);
                current_start = char_pos.saturating_sub(overlap_text.len());
                current = overlap_text;
            }

            current.push_str(sentence);
            char_pos += sentence_len;
        }

        if current.trim().len() >= self.min_size {
            chunks.push(Chunk::new(
                document_id,
                current.trim().to_string(),
                chunk_index,
                current_start,
                char_pos,
            ));
        }

        chunks
    }

    /// Tail of a chunk reused as overlap, trimmed to a sentence or word boundary
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        let tail = &text[start..];

        if let Some(pos) = tail.find(". ") {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }

        tail.to_string()
    }
}
