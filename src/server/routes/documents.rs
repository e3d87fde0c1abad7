//! Document listing endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::DocumentListResponse;

/// GET /list-documents - List documents in the source directory
///
/// This reads the filesystem, not the index, so files added since the last
/// rebuild show up immediately.
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    let documents = state.scanner().list_relative()?;

    tracing::info!("Listed {} documents", documents.len());

    Ok(Json(DocumentListResponse::success(documents)))
}
