//! umlhub CLI - `PlantUML` diagram indexer.
//!
//! Provides commands for:
//! - `serve`: Start the HTTP API
//! - `ingest`: Index one document and print the report
//! - `extract`: List the diagram blocks of a local file without indexing

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExtractArgs, IngestArgs, ServeArgs};
use output::Output;

/// umlhub - `PlantUML` diagram indexer.
#[derive(Parser)]
#[command(name = "umlhub", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve(ServeArgs),
    /// Index the diagrams of one document.
    Ingest(IngestArgs),
    /// Print the diagram blocks found in a local file.
    Extract(ExtractArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Serve(args) => args.verbose,
        Commands::Ingest(args) => args.verbose,
        Commands::Extract(_) => false,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(error::CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
        Commands::Ingest(args) => args.execute(),
        Commands::Extract(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
