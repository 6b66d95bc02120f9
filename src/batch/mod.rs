//! Batch orchestration over enumerated files.
//!
//! Every file is loaded and analyzed independently; whatever happens to one
//! file becomes that file's row and never stops the rest of the batch. Rows
//! come back in enumeration order in both sequential and parallel mode.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use rayon::prelude::*;

use crate::domain::{BatchOptions, BatchResult};
use crate::error::AnalysisError;
use crate::fit::analyze;
use crate::io::load_curve;

/// Everything the batch loop produced.
#[derive(Debug, Clone)]
pub struct BatchRunOutcome {
    /// One row per input file, in input order.
    pub results: Vec<BatchResult>,
    /// One advisory line per failed file, in input order.
    pub notices: Vec<String>,
    pub successes: usize,
    pub failures: usize,
}

/// Process `files` and accumulate per-file outcomes.
pub fn run_batch(files: &[PathBuf], opts: &BatchOptions) -> BatchRunOutcome {
    let results: Vec<BatchResult> = if opts.parallel {
        files.par_iter().map(|path| process_file(path, opts)).collect()
    } else {
        files.iter().map(|path| process_file(path, opts)).collect()
    };

    let mut notices = Vec::new();
    for row in &results {
        match &row.outcome {
            Ok(report) => debug!(
                "{}: {} peak(s), fitted {} samples from t={} (rmse={:.3e}, {} iterations)",
                row.path.display(),
                report.n_peaks,
                report.quality.n,
                report.peak_time,
                report.quality.rmse,
                report.quality.iterations
            ),
            Err(err) => {
                let notice = err.notice(&row.file);
                warn!("{notice}");
                notices.push(notice);
            }
        }
    }

    let successes = results.iter().filter(|r| r.is_success()).count();
    BatchRunOutcome {
        failures: results.len() - successes,
        successes,
        results,
        notices,
    }
}

fn process_file(path: &Path, opts: &BatchOptions) -> BatchResult {
    let outcome = load_curve(path, &opts.load).and_then(|curve| analyze(&curve, &opts.analysis));
    BatchResult {
        file: basename(path),
        path: path.to_path_buf(),
        outcome,
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchRunOutcome {
    /// Rows that failed, with their reason.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &AnalysisError)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.file.as_str(), e)))
    }
}
