//! Shared domain types.
//!
//! Everything that crosses a module boundary lives here:
//!
//! - raw samples (`Curve`) and what the analyzer returns for them
//! - per-file batch rows (`BatchResult`)
//! - the run configuration as understood by the pipeline (`BatchConfig`)

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AppError};

/// Decay model fitted to the region after the last peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `f(t) = A·exp(-t/tau) + C`
    Single,
    /// `f(t) = A1·exp(-t/tau1) + A2·exp(-t/tau2) + C`, with `tau1 < tau2`.
    Double,
}

/// Extra samples required beyond the parameter count.
const MIN_POINTS_BUFFER: usize = 2;

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Single => "single exponential",
            ModelKind::Double => "double exponential",
        }
    }

    /// Parameter names, in the order they appear in `FitParameters::values`
    /// and in result-table columns.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Single => &["A", "tau", "C"],
            ModelKind::Double => &["A1", "tau1", "A2", "tau2", "C"],
        }
    }

    pub fn param_count(self) -> usize {
        self.param_names().len()
    }

    /// Number of decay constants.
    pub fn tau_len(self) -> usize {
        match self {
            ModelKind::Single => 1,
            ModelKind::Double => 2,
        }
    }

    /// Number of parameters that enter the model linearly (amplitudes + offset).
    pub fn linear_len(self) -> usize {
        self.tau_len() + 1
    }

    /// Smallest trimmed curve we are willing to fit.
    pub fn min_points(self) -> usize {
        self.param_count() + MIN_POINTS_BUFFER
    }

    /// Indices of the tau entries inside the parameter vector.
    pub fn tau_indices(self) -> &'static [usize] {
        match self {
            ModelKind::Single => &[1],
            ModelKind::Double => &[1, 3],
        }
    }
}

/// One file's samples: strictly increasing time and the measured intensity.
///
/// Construct through [`Curve::new`], which enforces the invariants; the fields
/// are read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    time: Vec<f64>,
    intensity: Vec<f64>,
}

impl Curve {
    pub fn new(time: Vec<f64>, intensity: Vec<f64>) -> Result<Self, String> {
        if time.len() != intensity.len() {
            return Err(format!(
                "time has {} samples but intensity has {}",
                time.len(),
                intensity.len()
            ));
        }
        if time.len() < 2 {
            return Err(format!("need at least 2 samples, got {}", time.len()));
        }
        if let Some(i) = time.iter().chain(intensity.iter()).position(|v| !v.is_finite()) {
            return Err(format!("non-finite value at sample {}", i % time.len()));
        }
        if let Some(i) = time.windows(2).position(|w| w[1] <= w[0]) {
            return Err(format!("time is not strictly increasing at sample {}", i + 1));
        }
        Ok(Self { time, intensity })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The decay region: samples from `start` (inclusive) to the end, with
    /// time shifted so `time[start]` becomes `0`.
    ///
    /// Returns plain vectors rather than a `Curve` because a single trailing
    /// sample is a valid (if unfittable) region.
    pub fn decay_region(&self, start: usize) -> (Vec<f64>, Vec<f64>) {
        let start = start.min(self.len());
        let Some(&t0) = self.time.get(start) else {
            return (Vec::new(), Vec::new());
        };
        let t = self.time[start..].iter().map(|t| t - t0).collect();
        let y = self.intensity[start..].to_vec();
        (t, y)
    }
}

/// Ascending indices into a curve marking accepted local maxima.
pub type PeakSet = Vec<usize>;

/// Fitted parameters, laid out as `ModelKind::param_names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameters {
    pub model: ModelKind,
    pub values: Vec<f64>,
}

impl FitParameters {
    /// Look a parameter up by its column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.model
            .param_names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
    pub iterations: usize,
}

/// Everything the analyzer knows about a successful fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub params: FitParameters,
    pub quality: FitQuality,
    /// Number of peaks that passed detection.
    pub n_peaks: usize,
    /// Index (into the raw curve) of the peak the decay region starts at.
    pub peak_index: usize,
    /// Raw time of that peak.
    pub peak_time: f64,
}

/// One row of the batch accumulator.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// File basename, used as the table key.
    pub file: String,
    pub path: PathBuf,
    pub outcome: Result<FitReport, AnalysisError>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Peak detection thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakOptions {
    /// Minimum prominence as a fraction of the curve's `max - min`.
    pub min_prominence: f64,
    /// Minimum prominence as a fraction of the most prominent peak's.
    pub relative_prominence: f64,
    /// Minimum separation (in samples) between accepted peaks.
    pub min_distance: usize,
    /// Optional absolute height floor.
    pub min_height: Option<f64>,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            min_prominence: 0.2,
            relative_prominence: 0.5,
            min_distance: 1,
            min_height: None,
        }
    }
}

/// Options for the single-file analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub model: ModelKind,
    pub peaks: PeakOptions,
    pub max_iterations: usize,
    /// Wall-clock budget for the fit of one file.
    pub fit_timeout: Option<Duration>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            model: ModelKind::Single,
            peaks: PeakOptions::default(),
            max_iterations: 200,
            fit_timeout: Some(Duration::from_millis(5000)),
        }
    }
}

/// How raw files are parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub time_column: usize,
    pub intensity_column: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            time_column: 0,
            intensity_column: 1,
        }
    }
}

/// Options for the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOptions {
    pub load: LoadOptions,
    pub analysis: AnalysisOptions,
    /// Fan files out over the rayon pool instead of a plain loop.
    pub parallel: bool,
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    /// Infer a format from a file extension (`.csv`, `.tsv`/`.txt`, `.json`).
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ExportFormat::Csv),
            "tsv" | "txt" => Some(ExportFormat::Tsv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Built from defaults, then an optional TOML file, then CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub input_directory: PathBuf,
    pub glob_pattern: String,
    pub model: ModelKind,
    pub parallel: bool,
    /// Per-file fit budget in milliseconds (0 disables the budget).
    pub fit_timeout_ms: u64,
    pub max_iterations: usize,

    pub min_prominence: f64,
    pub relative_prominence: f64,
    pub min_distance: usize,
    pub min_height: Option<f64>,

    pub delimiter: char,
    pub time_column: usize,
    pub intensity_column: usize,

    /// Text written for missing parameters in delimited exports.
    pub missing_marker: String,
    pub export: Option<PathBuf>,
    pub export_format: Option<ExportFormat>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("."),
            glob_pattern: "*_CL_T*.csv".to_string(),
            model: ModelKind::Single,
            parallel: true,
            fit_timeout_ms: 5000,
            max_iterations: 200,
            min_prominence: 0.2,
            relative_prominence: 0.5,
            min_distance: 1,
            min_height: None,
            delimiter: ',',
            time_column: 0,
            intensity_column: 1,
            missing_marker: "NaN".to_string(),
            export: None,
            export_format: None,
        }
    }
}

impl BatchConfig {
    /// Derive the orchestrator options.
    ///
    /// The delimiter must be a single ASCII character; `validate` checks that.
    pub fn batch_options(&self) -> BatchOptions {
        let delimiter = u8::try_from(u32::from(self.delimiter)).unwrap_or(b',');
        BatchOptions {
            load: LoadOptions {
                delimiter,
                time_column: self.time_column,
                intensity_column: self.intensity_column,
            },
            analysis: AnalysisOptions {
                model: self.model,
                peaks: PeakOptions {
                    min_prominence: self.min_prominence,
                    relative_prominence: self.relative_prominence,
                    min_distance: self.min_distance,
                    min_height: self.min_height,
                },
                max_iterations: self.max_iterations,
                fit_timeout: (self.fit_timeout_ms > 0)
                    .then(|| Duration::from_millis(self.fit_timeout_ms)),
            },
            parallel: self.parallel,
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.delimiter.is_ascii() {
            return Err(AppError::new(
                2,
                format!("Delimiter must be a single ASCII character, got '{}'.", self.delimiter),
            ));
        }
        if self.glob_pattern.trim().is_empty() {
            return Err(AppError::new(2, "File pattern must not be empty."));
        }
        if !self.min_prominence.is_finite() || self.min_prominence < 0.0 {
            return Err(AppError::new(2, "min_prominence must be a finite value >= 0."));
        }
        if !(0.0..=1.0).contains(&self.relative_prominence) {
            return Err(AppError::new(2, "relative_prominence must be between 0 and 1."));
        }
        if self.min_height.is_some_and(|h| !h.is_finite()) {
            return Err(AppError::new(2, "min_height must be finite."));
        }
        if self.min_distance == 0 {
            return Err(AppError::new(2, "min_distance must be >= 1."));
        }
        if self.max_iterations == 0 {
            return Err(AppError::new(2, "max_iterations must be > 0."));
        }
        if self.time_column == self.intensity_column {
            return Err(AppError::new(2, "Time and intensity columns must differ."));
        }
        Ok(())
    }

    /// Resolve the export format: explicit setting, else the file extension,
    /// else CSV.
    pub fn resolved_export_format(&self) -> ExportFormat {
        self.export_format
            .or_else(|| self.export.as_deref().and_then(ExportFormat::from_path))
            .unwrap_or(ExportFormat::Csv)
    }
}
