//! Error types.
//!
//! Two layers:
//! - [`AppError`] fails the whole run and carries the process exit code
//!   (2 = bad input/config/export, 3 = nothing usable, 4 = internal numerics).
//! - [`AnalysisError`] is a per-file outcome. The batch loop turns it into a
//!   table row and an advisory notice; it never terminates the run.

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a single file produced no fit parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The decay signature is absent or undetectable.
    #[error("no peaks found")]
    NoPeaksFound,
    /// The solver could not reach an acceptable solution (includes too few
    /// samples after the peak and an exhausted time budget).
    #[error("fit did not converge: {reason}")]
    FitDidNotConverge { reason: String },
    /// The raw file could not be read or parsed.
    #[error("failed to load file: {reason}")]
    FileLoadError { reason: String },
}

impl AnalysisError {
    pub fn fit(reason: impl Into<String>) -> Self {
        AnalysisError::FitDidNotConverge {
            reason: reason.into(),
        }
    }

    pub fn load(reason: impl Into<String>) -> Self {
        AnalysisError::FileLoadError {
            reason: reason.into(),
        }
    }

    /// Short status label used in terminal tables.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisError::NoPeaksFound => "no-peaks",
            AnalysisError::FitDidNotConverge { .. } => "no-converge",
            AnalysisError::FileLoadError { .. } => "load-error",
        }
    }

    /// Advisory line for operators, naming the file.
    pub fn notice(&self, file: &str) -> String {
        match self {
            AnalysisError::NoPeaksFound => {
                format!("No peaks found for file {file} - might need to fit individually")
            }
            AnalysisError::FitDidNotConverge { reason } => {
                format!("Fit did not converge for file {file} ({reason}) - might need to fit individually")
            }
            AnalysisError::FileLoadError { reason } => {
                format!("Could not load file {file} ({reason}) - skipped")
            }
        }
    }
}
