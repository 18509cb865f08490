//! `umlhub serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use umlhub_config::{CliSettings, Config};
use umlhub_server::run_server;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover umlhub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Render service base URL (overrides config).
    #[arg(long)]
    renderer_url: Option<String>,

    /// Syntax-check service base URL (overrides config).
    #[arg(long)]
    syntax_checker_url: Option<String>,

    /// `SQLite` database URL, e.g. `sqlite://umlhub.db` (default: in-memory storage).
    #[arg(long)]
    database_url: Option<String>,

    /// Directory holding batch listing objects (overrides config).
    #[arg(long)]
    objects_dir: Option<PathBuf>,

    /// Enable verbose output (request and ingestion logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            renderer_url: self.renderer_url,
            syntax_checker_url: self.syntax_checker_url,
            database_url: self.database_url,
            objects_dir: self.objects_dir,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!("Renderer: {}", config.renderer.base_url));
        output.info(&format!("Syntax checker: {}", config.syntax_checker.base_url));
        match &config.store.database_url {
            Some(url) => output.info(&format!("Database: {url}")),
            None => output.warning("Database: none (records are kept in memory only)"),
        }
        output.info(&format!(
            "Batch objects: {}",
            config.notifications.objects_dir.display()
        ));

        run_server(&config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
