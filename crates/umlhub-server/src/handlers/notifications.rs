//! Object-store notification endpoint.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Serialize;
use umlhub_indexer::batch::{self, Notification};

use crate::error::ServerError;
use crate::handlers::run_blocking;
use crate::state::AppState;

/// Response for POST /notifications/objects.
#[derive(Serialize)]
pub(crate) struct NotificationResponse {
    /// Number of ingestion tasks enqueued.
    enqueued: usize,
}

/// Handle POST /notifications/objects.
///
/// Only malformed JSON is rejected; notifications that are not about a
/// finalized object are acknowledged without doing anything.
pub(crate) async fn receive_object_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<NotificationResponse>, ServerError> {
    let notification: Notification = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid notification: {e}")))?;

    let enqueued = run_blocking(move || {
        Ok(batch::dispatch(
            &notification,
            state.objects.as_ref(),
            state.queue.as_ref(),
            state.task_delay,
        )?)
    })
    .await?;

    Ok(Json(NotificationResponse { enqueued }))
}
