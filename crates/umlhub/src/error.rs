//! CLI error types.

use umlhub_config::ConfigError;
use umlhub_indexer::IndexError;
use umlhub_store::StoreError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Index(#[from] IndexError),

    #[error("{0}")]
    Server(String),
}
