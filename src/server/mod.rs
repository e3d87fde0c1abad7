//! HTTP server for the Q&A service

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Q&A HTTP server
pub struct AppServer {
    config: AppConfig,
    state: AppState,
}

impl AppServer {
    /// Create a new server
    pub async fn new(config: AppConfig) -> Result<Self> {
        let state = AppState::new(config.clone()).await?;

        // Build or refresh the index before accepting traffic
        if config.source.auto_setup {
            match state.sync_index().await {
                Ok(true) => tracing::info!("Index built on startup"),
                Ok(false) => {}
                Err(e) => tracing::error!("Startup index sync failed: {}", e),
            }
        }

        Ok(Self { config, state })
    }

    /// Build the router with all routes
    fn build_router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Assemble the full router: API routes, probes, static frontend, middleware
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .merge(routes::api_routes())
        .with_state(state)
        // The chat frontend; unknown paths fall through to it
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        );

    if config.server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> axum::http::StatusCode {
    if state.is_ready() {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::index::ChunkIndex;
    use crate::providers::{EmbeddingProvider, LlmProvider};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Deterministic embedder: fixed-dimension character histogram
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            let mut v = vec![0.0f32; 16];
            for b in text.bytes() {
                v[(b % 16) as usize] += 1.0;
            }
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            16
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// LLM stub that echoes the question and context size
    struct StubLlm;

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn answer(&self, question: &str, context: &str) -> crate::error::Result<String> {
            Ok(format!(
                "Answering \"{}\" from {} context characters.",
                question,
                context.len()
            ))
        }

        async fn health_check(&self) -> crate::error::Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn test_router(source_dir: &Path) -> Router {
        let mut config = AppConfig::default();
        config.source.data_dir = source_dir.to_path_buf();
        config.chunking.chunk_size = 200;
        config.chunking.chunk_overlap = 40;
        config.chunking.min_chunk_size = 10;

        let state = AppState::with_providers(
            config.clone(),
            Arc::new(ChunkIndex::in_memory().unwrap()),
            Arc::new(StubEmbedder),
            Arc::new(StubLlm),
        );

        build_router(state, &config)
    }

    fn seeded_corpus() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("auth.md"),
            "The login flow validates credentials against the user store. ".repeat(5),
        )
        .unwrap();
        fs::write(
            dir.path().join("deploy.txt"),
            "Deployments run through the staging environment first. ".repeat(5),
        )
        .unwrap();
        dir
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let dir = TempDir::new().unwrap();
        let router = test_router(dir.path());

        let response = router.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn setup_database_indexes_the_corpus() {
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let (status, body) = send(router, post_json("/setup-database", "{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body["message"].as_str().unwrap().contains("2 documents"));
    }

    #[tokio::test]
    async fn setup_database_with_empty_corpus_reports_error_status() {
        let dir = TempDir::new().unwrap();
        let router = test_router(dir.path());

        let (status, body) = send(router, post_json("/setup-database", "{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("no documents"));
    }

    #[tokio::test]
    async fn delete_database_always_succeeds() {
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let (_, body) = send(router.clone(), post_json("/setup-database", "{}")).await;
        assert_eq!(body["status"], "success");

        let (status, body) = send(router, post_json("/delete-database", "{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn update_database_accepts_a_new_source_dir() {
        let first = seeded_corpus();
        let second = TempDir::new().unwrap();
        fs::write(
            second.path().join("only.md"),
            "A different corpus with a single document in it. ".repeat(5),
        )
        .unwrap();

        let router = test_router(first.path());

        let body = format!(
            r#"{{"source_dir": "{}"}}"#,
            second.path().display().to_string().replace('\\', "/")
        );
        let (status, response) = send(router.clone(), post_json("/update-database", &body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["status"], "success");
        assert!(response["message"].as_str().unwrap().contains("1 documents"));

        // The listing now reflects the new directory
        let (_, listing) = send(router, get("/list-documents")).await;
        assert_eq!(listing["documents"], serde_json::json!(["only.md"]));
    }

    #[tokio::test]
    async fn update_database_without_a_body_rebuilds_in_place() {
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let request = Request::builder()
            .method("POST")
            .uri("/update-database")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn list_documents_returns_relative_paths() {
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let (status, body) = send(router, get("/list-documents")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["documents"], serde_json::json!(["auth.md", "deploy.txt"]));
    }

    #[tokio::test]
    async fn list_documents_on_empty_corpus_returns_empty_array() {
        let dir = TempDir::new().unwrap();
        let router = test_router(dir.path());

        let (status, body) = send(router, get("/list-documents")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["documents"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn ask_returns_a_grounded_answer() {
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let (_, body) = send(router.clone(), post_json("/setup-database", "{}")).await;
        assert_eq!(body["status"], "success");

        let (status, body) = send(
            router,
            post_json("/ask", r#"{"question": "How does the login flow work?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body["response"]
            .as_str()
            .unwrap()
            .contains("How does the login flow work?"));
    }

    #[tokio::test]
    async fn ask_with_empty_question_is_rejected_without_reaching_the_llm() {
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let (status, body) = send(router, post_json("/ask", r#"{"question": "   "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn ask_with_invalid_json_is_a_bad_request() {
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let (status, body) = send(router, post_json("/ask", "not json at all")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn ask_with_an_empty_index_still_answers() {
        // No setup call: retrieval finds nothing, the LLM gets the
        // no-context notice and can say so.
        let dir = seeded_corpus();
        let router = test_router(dir.path());

        let (status, body) = send(
            router,
            post_json("/ask", r#"{"question": "Anything at all?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
    }
}
