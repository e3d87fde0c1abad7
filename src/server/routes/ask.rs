//! Question answering endpoint

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /ask - Answer a question from the indexed corpus
pub async fn ask(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>> {
    let start = Instant::now();

    let Json(request) = payload
        .map_err(|_| Error::invalid_request("Invalid JSON or empty request body"))?;

    let question = request.question.trim();
    if question.is_empty() {
        tracing::warn!("Empty question submitted");
        return Err(Error::invalid_request("The question must not be empty"));
    }

    tracing::info!("Question: \"{}\"", question);

    // Retrieve context with similarity search
    let query_embedding = state.embedder().embed(question).await?;
    let results = state
        .index()
        .search(&query_embedding, state.config().retrieval.top_k)?;

    if results.is_empty() {
        tracing::warn!("No matching chunks found for question");
    } else {
        for (i, result) in results.iter().enumerate() {
            tracing::debug!(
                "Match {} (similarity {:.4}): {}",
                i + 1,
                result.similarity,
                result.path
            );
        }
    }

    // Generate the answer from the retrieved context
    let context = PromptBuilder::build_context(&results);
    let answer = state.llm().answer(question, &context).await?;

    tracing::info!(
        "Answer generated ({} characters) in {}ms",
        answer.len(),
        start.elapsed().as_millis()
    );

    Ok(Json(AskResponse::success(answer)))
}
