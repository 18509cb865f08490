//! Per-request context.

use uuid::Uuid;

/// Request-scoped values passed explicitly through ingestion and queries.
///
/// Every component that logs on behalf of a request takes a `&RequestContext`
/// so log lines can be correlated without any process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
}

impl RequestContext {
    /// Create a context with a fresh random request id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a context carrying a caller-supplied request id.
    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
