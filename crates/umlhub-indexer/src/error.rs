//! Indexing errors.

use umlhub_diagrams::ServiceError;
use umlhub_store::StoreError;

use crate::source::SourceError;

/// Error that aborts an ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IndexError {
    /// Whether the failure was caused by the request rather than a dependency.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Source(e) => e.is_input_error(),
            Self::Service(_) | Self::Store(_) => false,
        }
    }
}
