//! `umlhub ingest` command implementation.

use std::path::PathBuf;

use clap::Args;
use umlhub_config::{CliSettings, Config};
use umlhub_indexer::{FailurePolicy, IngestReport};
use umlhub_model::RequestContext;
use umlhub_server::{Storage, build_indexer};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the ingest command.
#[derive(Args)]
pub(crate) struct IngestArgs {
    /// GitHub blob URL of the document to index.
    url: String,

    /// Path to configuration file (default: auto-discover umlhub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render service base URL (overrides config).
    #[arg(long)]
    renderer_url: Option<String>,

    /// Syntax-check service base URL (overrides config).
    #[arg(long)]
    syntax_checker_url: Option<String>,

    /// `SQLite` database URL (overrides config).
    #[arg(long)]
    database_url: Option<String>,

    /// Keep going when a block fails instead of aborting.
    #[arg(long)]
    continue_on_error: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl IngestArgs {
    /// Execute the ingest command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or storage fails, or the ingestion
    /// aborts.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            renderer_url: self.renderer_url,
            syntax_checker_url: self.syntax_checker_url,
            database_url: self.database_url,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if config.store.database_url.is_none() {
            output.warning("No database configured; results are discarded on exit");
        }

        // The SQLite backend drives its pool through this runtime from the
        // current thread, so the runtime must outlive the ingestion.
        let runtime = tokio::runtime::Runtime::new()?;
        let storage = runtime.block_on(Storage::open(&config.store))?;

        let mut indexer = build_indexer(&config, &storage);
        if self.continue_on_error {
            indexer = indexer.with_failure_policy(FailurePolicy::Continue);
        }

        output.info(&format!("Ingesting {}", self.url));
        let report = indexer.ingest_url(&RequestContext::new(), &self.url)?;
        print_report(&output, &report);

        Ok(())
    }
}

fn print_report(output: &Output, report: &IngestReport) {
    let ids: Vec<String> = report.indexed.iter().map(ToString::to_string).collect();
    output.success(&format!(
        "Indexed {} diagram(s){}",
        report.indexed.len(),
        if ids.is_empty() {
            String::new()
        } else {
            format!(": {}", ids.join(", "))
        }
    ));

    for skipped in &report.skipped {
        output.warning(&format!(
            "  block {} skipped: {:?}",
            skipped.index, skipped.reason
        ));
    }
    for failed in &report.failed {
        output.error(&format!("  block {} failed: {}", failed.index, failed.error));
    }
}
