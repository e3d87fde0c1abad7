//! Application state for the Q&A server

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::corpus::{BuildSummary, Indexer, SourceScanner};
use crate::error::Result;
use crate::generation::AnthropicClient;
use crate::index::ChunkIndex;
use crate::providers::{EmbeddingProvider, LlmProvider, OnnxEmbedder};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Chunk index
    index: Arc<ChunkIndex>,
    /// Embedding provider
    embedder: Arc<dyn EmbeddingProvider>,
    /// LLM provider
    llm: Arc<dyn LlmProvider>,
    /// Current source directory (update-database may replace it)
    source_dir: RwLock<PathBuf>,
    /// Serializes setup/delete/update so rebuilds cannot interleave
    rebuild_lock: Mutex<()>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create new application state with the default providers
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let index = Arc::new(ChunkIndex::new(&config.index.db_path)?);
        tracing::info!("Chunk index opened at {}", config.index.db_path.display());

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(OnnxEmbedder::new(&config.embeddings).await?);
        tracing::info!(
            "Embedding provider initialized ({} dims)",
            embedder.dimensions()
        );

        let llm: Arc<dyn LlmProvider> = Arc::new(AnthropicClient::new(&config.llm)?);
        tracing::info!("LLM provider initialized (model: {})", llm.model());

        Ok(Self::with_providers(config, index, embedder, llm))
    }

    /// Create state from pre-built providers
    pub fn with_providers(
        config: AppConfig,
        index: Arc<ChunkIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let source_dir = config.source.data_dir.clone();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                index,
                embedder,
                llm,
                source_dir: RwLock::new(source_dir),
                rebuild_lock: Mutex::new(()),
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the chunk index
    pub fn index(&self) -> &Arc<ChunkIndex> {
        &self.inner.index
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get the LLM provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// A scanner over the current source directory
    pub fn scanner(&self) -> SourceScanner {
        SourceScanner::new(
            self.inner.source_dir.read().clone(),
            self.inner.config.source.extensions.clone(),
        )
    }

    /// Current source directory
    pub fn source_dir(&self) -> PathBuf {
        self.inner.source_dir.read().clone()
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Rebuild the index, optionally switching the source directory first
    pub async fn rebuild_index(&self, new_source_dir: Option<PathBuf>) -> Result<BuildSummary> {
        let _guard = self.inner.rebuild_lock.lock().await;

        if let Some(dir) = new_source_dir {
            tracing::info!("Switching source directory to {}", dir.display());
            *self.inner.source_dir.write() = dir;
        }

        let scanner = self.scanner();
        let indexer = Indexer::new(
            &self.inner.index,
            self.inner.embedder.as_ref(),
            &self.inner.config.chunking,
        );

        indexer.rebuild(&scanner).await
    }

    /// Delete all index contents; returns the number of chunks removed
    pub async fn clear_index(&self) -> Result<usize> {
        let _guard = self.inner.rebuild_lock.lock().await;
        self.inner.index.clear()
    }

    /// Build or refresh the index on startup if the corpus changed
    pub async fn sync_index(&self) -> Result<bool> {
        let _guard = self.inner.rebuild_lock.lock().await;

        let scanner = self.scanner();
        let indexer = Indexer::new(
            &self.inner.index,
            self.inner.embedder.as_ref(),
            &self.inner.config.chunking,
        );

        indexer.sync_if_stale(&scanner).await
    }
}
