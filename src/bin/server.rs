//! Q&A server binary
//!
//! Run with: cargo run --bin askdocs-server

use askdocs::{config::AppConfig, server::AppServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_PATH: &str = "askdocs.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askdocs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         askdocs                           ║
║             Document Q&A over a local corpus              ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration (defaults when no config file is present)
    let config = AppConfig::load(CONFIG_PATH)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Source directory: {}", config.source.data_dir.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    // Create and start server (builds the index on startup when configured)
    let server = AppServer::new(config).await?;

    println!("\nServer starting...");
    println!("  UI:     http://{}/", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /setup-database  - Build the index");
    println!("  POST /delete-database - Clear the index");
    println!("  POST /update-database - Rebuild the index");
    println!("  GET  /list-documents  - List corpus documents");
    println!("  POST /ask             - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
