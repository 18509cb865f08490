//! Ingestion endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Deserialize;
use umlhub_indexer::IngestReport;

use crate::error::ServerError;
use crate::handlers::{request_context, run_blocking};
use crate::state::AppState;

/// Request body for POST /indexes.
#[derive(Deserialize)]
pub(crate) struct IngestRequest {
    /// Origin URL of the document to index.
    url: String,
}

/// Handle POST /indexes.
///
/// Runs the whole ingestion before answering.
pub(crate) async fn create_index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestReport>, ServerError> {
    let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let ctx = request_context(&headers);
    let indexer = Arc::clone(&state.indexer);

    let report = run_blocking(move || Ok(indexer.ingest_url(&ctx, &request.url)?)).await?;
    Ok(Json(report))
}
