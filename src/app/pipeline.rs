//! Shared batch pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! enumerate -> load/analyze each file -> build the result table
//!
//! The CLI then only has to print and export.

use std::path::PathBuf;

use log::info;

use crate::batch::{BatchRunOutcome, run_batch};
use crate::domain::BatchConfig;
use crate::error::AppError;
use crate::io::enumerate_files;
use crate::report::ResultTable;

/// All computed outputs of a single `clfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub files: Vec<PathBuf>,
    pub outcome: BatchRunOutcome,
    pub table: ResultTable,
}

/// Execute the full batch pipeline and return the computed outputs.
pub fn run_pipeline(config: &BatchConfig) -> Result<RunOutput, AppError> {
    let files = enumerate_files(&config.input_directory, &config.glob_pattern)?;
    info!(
        "{} file(s) matching '{}' in {}",
        files.len(),
        config.glob_pattern,
        config.input_directory.display()
    );

    let outcome = run_batch(&files, &config.batch_options());
    let table = ResultTable::build(config.model, &outcome.results);
    info!(
        "batch done: {} fitted, {} need attention",
        outcome.successes, outcome.failures
    );

    Ok(RunOutput {
        files,
        outcome,
        table,
    })
}
