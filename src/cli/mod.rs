//! Command-line parsing for the batch decay fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code.
//!
//! `fit` flags are all optional so that a TOML config (`--config`) can supply
//! them; a flag given on the command line always wins.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{ExportFormat, ModelKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "clfit", version, about = "Batch chemiluminescence decay-curve fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every matching trace in a directory and print the result table.
    Fit(FitArgs),
    /// Write a set of synthetic traces for trying out `fit`.
    Synth(SynthArgs),
}

/// Options for a batch fit.
#[derive(Debug, Parser, Clone, Default)]
pub struct FitArgs {
    /// TOML file with run settings.
    #[arg(short = 'c', long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Directory to scan for traces.
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub input_directory: Option<PathBuf>,

    /// File-name pattern (`*` and `?` wildcards).
    #[arg(short = 'p', long = "pattern")]
    pub glob_pattern: Option<String>,

    /// Decay model to fit.
    #[arg(short = 'm', long, value_enum)]
    pub model: Option<ModelKind>,

    /// Process files one at a time.
    #[arg(long)]
    pub sequential: bool,

    /// Per-file fit budget in milliseconds (0 disables it).
    #[arg(long = "timeout-ms")]
    pub fit_timeout_ms: Option<u64>,

    /// Gauss-Newton iteration cap.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Minimum peak prominence, as a fraction of the trace range.
    #[arg(long)]
    pub min_prominence: Option<f64>,

    /// Minimum peak prominence, as a fraction of the most prominent peak.
    #[arg(long)]
    pub relative_prominence: Option<f64>,

    /// Minimum distance between peaks, in samples.
    #[arg(long)]
    pub min_distance: Option<usize>,

    /// Minimum absolute peak height.
    #[arg(long)]
    pub min_height: Option<f64>,

    /// Input field delimiter.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Zero-based time column.
    #[arg(long)]
    pub time_column: Option<usize>,

    /// Zero-based intensity column.
    #[arg(long)]
    pub intensity_column: Option<usize>,

    /// Text written for parameters of failed files.
    #[arg(long)]
    pub missing_marker: Option<String>,

    /// Export the result table.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Export format (defaults to the export file extension).
    #[arg(long = "format", value_enum)]
    pub export_format: Option<ExportFormat>,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output directory (created if missing).
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Number of files.
    #[arg(short = 'n', long, default_value_t = 12)]
    pub count: usize,

    /// File-name prefix.
    #[arg(long, default_value = "S1")]
    pub prefix: String,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Make every k-th file a flat baseline with no peak.
    #[arg(long)]
    pub flat_every: Option<usize>,

    /// Gaussian noise standard deviation.
    #[arg(long, default_value_t = 0.005)]
    pub noise: f64,

    /// Samples per trace.
    #[arg(long, default_value_t = 600)]
    pub samples: usize,

    /// Sample spacing.
    #[arg(long, default_value_t = 0.02)]
    pub dt: f64,
}
