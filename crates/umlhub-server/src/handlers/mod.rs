//! HTTP request handlers.

pub(crate) mod diagrams;
pub(crate) mod ingest;
pub(crate) mod notifications;

use axum::http::HeaderMap;
use umlhub_model::RequestContext;

use crate::error::ServerError;

/// Header carrying a caller-supplied request id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the request context, reusing the caller's request id when present.
pub(crate) fn request_context(headers: &HeaderMap) -> RequestContext {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(RequestContext::new, RequestContext::with_request_id)
}

/// Run blocking pipeline or store code off the async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, ServerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
