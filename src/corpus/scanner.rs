//! Source directory scanning

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A document file found in the source directory
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the source directory (used as the document name)
    pub relative: String,
    /// Filesystem modification time
    pub modified: DateTime<Utc>,
    /// File size in bytes
    pub size: u64,
}

/// Recursive scanner for the document source directory
pub struct SourceScanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl SourceScanner {
    /// Create a scanner for the given directory and extension set
    pub fn new(root: PathBuf, extensions: Vec<String>) -> Self {
        Self { root, extensions }
    }

    /// The directory being scanned
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find all documents under the source directory
    pub fn scan(&self) -> Result<Vec<SourceFile>> {
        if !self.root.exists() {
            return Err(Error::Source(format!(
                "Source directory does not exist: {}",
                self.root.display()
            )));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let modified: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();

            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                relative,
                modified,
                size: metadata.len(),
            });
        }

        // Deterministic ordering for listings and change detection
        files.sort_by(|a, b| a.relative.cmp(&b.relative));

        Ok(files)
    }

    /// List document paths relative to the source directory
    pub fn list_relative(&self) -> Result<Vec<String>> {
        Ok(self.scan()?.into_iter().map(|f| f.relative).collect())
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                self.extensions.iter().any(|known| known == &e)
            })
            .unwrap_or(false)
    }
}

/// Read a source file as UTF-8 text
pub fn read_source_file(file: &SourceFile) -> Result<String> {
    std::fs::read_to_string(&file.path).map_err(|e| {
        Error::Source(format!("Failed to read {}: {}", file.path.display(), e))
    })
}
