//! `umlhub extract` command implementation.

use std::path::PathBuf;

use clap::Args;
use umlhub_diagrams::{Extractor, MIN_BLOCK_LENGTH};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the extract command.
#[derive(Args)]
pub(crate) struct ExtractArgs {
    /// Text file to scan.
    file: PathBuf,

    /// Minimum block length in characters.
    #[arg(long, default_value_t = MIN_BLOCK_LENGTH)]
    min_length: usize,
}

impl ExtractArgs {
    /// Execute the extract command.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let text = std::fs::read_to_string(&self.file)?;
        let extractor = Extractor::default().min_length(self.min_length);

        let mut count = 0;
        for block in extractor.extract(&text) {
            count += 1;
            output.highlight(&format!("# block {count} (bytes {}..{})", block.start, block.end));
            output.data(block.text);
        }

        output.info(&format!(
            "{count} block(s) found in {}",
            self.file.display()
        ));
        Ok(())
    }
}
