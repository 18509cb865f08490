//! HTTP server for umlhub.
//!
//! This crate serves a JSON API over axum:
//! - `POST /indexes` ingests one document synchronously
//! - `POST /notifications/objects` turns an object-store notification into
//!   deferred ingestion tasks
//! - `GET /`, `GET /search` and `GET /items/{id}` read indexed diagrams
//!
//! The ingestion pipeline and the storage backends are blocking, so handlers
//! run them on tokio's blocking pool.
//!
//! # Quick Start
//!
//! ```ignore
//! use umlhub_config::Config;
//! use umlhub_server::run_server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     run_server(&config).await.unwrap();
//! }
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;
mod tasks;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use umlhub_config::{BlockErrorPolicy, Config, StoreConfig};
use umlhub_diagrams::{Extractor, RenderClient, SyntaxCheckClient};
use umlhub_indexer::batch::FsObjectSource;
use umlhub_indexer::{FailurePolicy, GitHubSource, Indexer};
use umlhub_query::QueryService;
use umlhub_store::{
    DiagramStore, MemorySearchIndex, MemoryStore, SearchIndex, SqliteDatabase, StoreError,
};

pub use app::create_router;
pub use error::ServerError;
pub use state::AppState;
pub use tasks::LocalTaskQueue;

/// Record store and search index opened from configuration.
pub struct Storage {
    pub store: Arc<dyn DiagramStore>,
    pub search: Arc<dyn SearchIndex>,
}

impl Storage {
    /// Open the configured backend: `SQLite` when a database URL is set,
    /// in-memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(url) = &config.database_url {
            let database = SqliteDatabase::connect(url).await?;
            tracing::info!(database_url = %url, "Using SQLite storage");
            return Ok(Self {
                store: Arc::new(database.store()),
                search: Arc::new(database.search_index()),
            });
        }

        tracing::info!("Using in-memory storage");
        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            search: Arc::new(MemorySearchIndex::new()),
        })
    }
}

/// Build the ingestion pipeline from configuration.
#[must_use]
pub fn build_indexer(config: &Config, storage: &Storage) -> Indexer {
    let source = GitHubSource::new(
        config.github.api_url.clone(),
        config.github.token().map(str::to_owned),
        config.github.timeout(),
    );
    let validator = SyntaxCheckClient::with_timeout(
        config.syntax_checker.base_url.clone(),
        config.syntax_checker.timeout(),
    );
    let renderer =
        RenderClient::with_timeout(config.renderer.base_url.clone(), config.renderer.timeout());
    let failure_policy = match config.indexer.on_block_error {
        BlockErrorPolicy::Abort => FailurePolicy::FailFast,
        BlockErrorPolicy::Continue => FailurePolicy::Continue,
    };

    Indexer::new(
        Arc::new(source),
        Arc::new(validator),
        Arc::new(renderer),
        Arc::clone(&storage.store),
        Arc::clone(&storage.search),
    )
    .with_extractor(Extractor::default().min_length(config.indexer.min_block_length))
    .with_failure_policy(failure_policy)
}

/// Build the query service from configuration.
#[must_use]
pub fn build_query_service(config: &Config, storage: &Storage) -> QueryService {
    QueryService::new(Arc::clone(&storage.store), Arc::clone(&storage.search))
        .with_page_size(config.query.page_size)
}

/// Build application state, starting the local task queue.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns [`StoreError`] if storage cannot be opened.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>, StoreError> {
    let storage = Storage::open(&config.store).await?;
    let indexer = Arc::new(build_indexer(config, &storage));
    let query = Arc::new(build_query_service(config, &storage));
    let queue = LocalTaskQueue::start(Arc::clone(&indexer));

    Ok(Arc::new(AppState {
        indexer,
        query,
        objects: Arc::new(FsObjectSource::new(config.notifications.objects_dir.clone())),
        queue: Arc::new(queue),
        task_delay: config.indexer.task_delay(),
    }))
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if storage cannot be opened or the server fails to start.
pub async fn run_server(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config).await?;
    let app = create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.server.host, config.server.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
