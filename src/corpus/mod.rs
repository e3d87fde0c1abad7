//! Source corpus scanning, chunking, and indexing

mod chunker;
mod indexer;
mod scanner;

pub use chunker::TextChunker;
pub use indexer::{BuildSummary, Indexer};
pub use scanner::{read_source_file, SourceFile, SourceScanner};
