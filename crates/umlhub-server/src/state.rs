//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;
use std::time::Duration;

use umlhub_indexer::Indexer;
use umlhub_indexer::batch::{ObjectSource, TaskQueue};
use umlhub_query::QueryService;

/// Shared application state.
pub struct AppState {
    /// Ingestion pipeline.
    pub indexer: Arc<Indexer>,
    /// Listing and search.
    pub query: Arc<QueryService>,
    /// Where batch listings are read from.
    pub objects: Arc<dyn ObjectSource>,
    /// Where batch ingestion tasks go.
    pub queue: Arc<dyn TaskQueue>,
    /// Spacing between consecutive tasks of one batch.
    pub task_delay: Duration,
}
