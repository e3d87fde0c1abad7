//! Index lifecycle endpoints: setup, delete, update

use axum::{extract::State, Json};
use std::path::PathBuf;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{OpResponse, UpdateDatabaseRequest};

/// POST /setup-database - Build the index from the source directory
pub async fn setup_database(State(state): State<AppState>) -> Result<Json<OpResponse>> {
    tracing::info!("Database setup requested");

    let summary = state.rebuild_index(None).await?;

    if summary.documents == 0 {
        tracing::warn!(
            "No documents found in {}",
            state.source_dir().display()
        );
        return Ok(Json(OpResponse::error("Failed to create database: no documents found")));
    }

    Ok(Json(OpResponse::success(format!(
        "Database created successfully ({} documents, {} chunks)",
        summary.documents, summary.chunks
    ))))
}

/// POST /delete-database - Remove all indexed chunks and documents
pub async fn delete_database(State(state): State<AppState>) -> Result<Json<OpResponse>> {
    tracing::info!("Database deletion requested");

    let deleted = state.clear_index().await?;
    tracing::info!("Deleted {} chunks", deleted);

    Ok(Json(OpResponse::success("Database deleted successfully")))
}

/// POST /update-database - Rebuild, optionally from a new source directory
///
/// The body is optional; `{"source_dir": "..."}` switches the corpus location
/// before rebuilding.
pub async fn update_database(
    State(state): State<AppState>,
    body: Option<Json<UpdateDatabaseRequest>>,
) -> Result<Json<OpResponse>> {
    tracing::info!("Database update requested");

    let new_source_dir = body
        .and_then(|Json(request)| request.source_dir)
        .map(PathBuf::from);

    let summary = state.rebuild_index(new_source_dir).await?;

    if summary.documents == 0 {
        return Ok(Json(OpResponse::error("Failed to update database: no documents found")));
    }

    Ok(Json(OpResponse::success(format!(
        "Database updated successfully ({} documents, {} chunks)",
        summary.documents, summary.chunks
    ))))
}
