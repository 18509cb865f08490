//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use umlhub_indexer::IndexError;
use umlhub_indexer::batch::BatchError;
use umlhub_store::StoreError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Request body or parameters could not be used.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No diagram with the given id.
    #[error("Diagram not found: {0}")]
    DiagramNotFound(String),

    /// Ingestion failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Batch notification could not be dispatched.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Store or search index failure on the read path.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Blocking task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::DiagramNotFound(_) => StatusCode::NOT_FOUND,
            Self::Index(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            Self::Batch(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            Self::Index(_) | Self::Batch(_) | Self::Store(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, axum::Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use umlhub_indexer::SourceError;
    use umlhub_store::StoreErrorKind;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ServerError::BadRequest("bad".to_owned()),
                StatusCode::BAD_REQUEST,
            ),
            (ServerError::DiagramNotFound("7".to_owned()), StatusCode::NOT_FOUND),
            (
                ServerError::Index(IndexError::Source(SourceError::UnrecognizedUrl(
                    "x".to_owned(),
                ))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Index(IndexError::Source(SourceError::Http("refused".to_owned()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServerError::Batch(BatchError::MissingObjectId),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Store(StoreError::new(StoreErrorKind::Unavailable)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }
}
