//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - merges the optional TOML config with CLI flags
//! - runs the batch pipeline
//! - prints the report
//! - writes the optional export

use clap::Parser;
use log::info;

use crate::cli::{Command, FitArgs, SynthArgs};
use crate::data::{SynthConfig, TraceShape, write_synthetic_dataset};
use crate::domain::BatchConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `clfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = batch_config_from_args(&args)?;
    let run = pipeline::run_pipeline(&config)?;

    println!("{}", crate::report::format_run_header(&config, run.files.len()));
    println!(
        "{}",
        crate::report::format_results(&run.table, &run.outcome, &config.missing_marker)
    );
    println!("{}", crate::report::format_summary(&run.outcome));

    if let Some(path) = &config.export {
        let format = config.resolved_export_format();
        crate::io::write_table(path, &run.table, format, &config.missing_marker)?;
        info!("wrote {} row(s) to {} ({format:?})", run.table.len(), path.display());
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = SynthConfig {
        out_dir: args.out,
        prefix: args.prefix,
        count: args.count,
        seed: args.seed,
        flat_every: args.flat_every,
        shape: TraceShape {
            samples: args.samples,
            dt: args.dt,
            noise: args.noise,
            ..TraceShape::default()
        },
    };
    if !(config.shape.dt.is_finite() && config.shape.dt > 0.0) {
        return Err(AppError::new(2, "Sample spacing must be > 0."));
    }

    let files = write_synthetic_dataset(&config)?;
    for file in &files {
        match file.params {
            Some([a, tau, c]) => println!("{}  A={a:.4} tau={tau:.4} C={c:.4}", file.path.display()),
            None => println!("{}  flat", file.path.display()),
        }
    }
    println!("Wrote {} file(s) to {}", files.len(), config.out_dir.display());
    Ok(())
}

/// Build the run configuration: defaults, then the config file, then flags.
pub fn batch_config_from_args(args: &FitArgs) -> Result<BatchConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => crate::io::read_config(path)?,
        None => BatchConfig::default(),
    };

    if let Some(v) = &args.input_directory {
        config.input_directory = v.clone();
    }
    if let Some(v) = &args.glob_pattern {
        config.glob_pattern = v.clone();
    }
    if let Some(v) = args.model {
        config.model = v;
    }
    if args.sequential {
        config.parallel = false;
    }
    if let Some(v) = args.fit_timeout_ms {
        config.fit_timeout_ms = v;
    }
    if let Some(v) = args.max_iterations {
        config.max_iterations = v;
    }
    if let Some(v) = args.min_prominence {
        config.min_prominence = v;
    }
    if let Some(v) = args.relative_prominence {
        config.relative_prominence = v;
    }
    if let Some(v) = args.min_distance {
        config.min_distance = v;
    }
    if let Some(v) = args.min_height {
        config.min_height = Some(v);
    }
    if let Some(v) = args.delimiter {
        config.delimiter = v;
    }
    if let Some(v) = args.time_column {
        config.time_column = v;
    }
    if let Some(v) = args.intensity_column {
        config.intensity_column = v;
    }
    if let Some(v) = &args.missing_marker {
        config.missing_marker = v.clone();
    }
    if let Some(v) = &args.export {
        config.export = Some(v.clone());
    }
    if let Some(v) = args.export_format {
        config.export_format = Some(v);
    }

    config.validate()?;
    Ok(config)
}
