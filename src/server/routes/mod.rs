//! API routes for the Q&A server

pub mod ask;
pub mod database;
pub mod documents;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
///
/// The paths are flat (no `/api` prefix): the static frontend calls them
/// relative to the page origin.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Index lifecycle
        .route("/setup-database", post(database::setup_database))
        .route("/delete-database", post(database::delete_database))
        .route("/update-database", post(database::update_database))
        // Corpus listing
        .route("/list-documents", get(documents::list_documents))
        // Question answering
        .route("/ask", post(ask::ask))
}
