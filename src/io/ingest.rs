//! CSV ingest for decay traces.
//!
//! Turns one delimited file into a validated [`Curve`]:
//!
//! - two selected columns (time, intensity), others ignored
//! - leading non-numeric lines are headers and skipped
//! - `#` lines are comments
//! - anything non-numeric once data has started is an error naming the line
//!
//! Failures are per-file (`AnalysisError::FileLoadError`); the batch keeps going.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Curve, LoadOptions};
use crate::error::AnalysisError;

/// Load one trace from `path`.
pub fn load_curve(path: &Path, opts: &LoadOptions) -> Result<Curve, AnalysisError> {
    let file = File::open(path)
        .map_err(|e| AnalysisError::load(format!("failed to open '{}': {e}", path.display())))?;
    read_curve(file, opts)
}

/// Parse a trace from any reader (used by `load_curve` and tests).
pub fn read_curve<R: std::io::Read>(reader: R, opts: &LoadOptions) -> Result<Curve, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .delimiter(opts.delimiter)
        .from_reader(reader);

    let mut time = Vec::new();
    let mut intensity = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| AnalysisError::load(format!("CSV parse error: {e}")))?;
        let line = record.position().map_or(0, |p| p.line());

        match parse_pair(&record, opts) {
            Some((t, y)) => {
                time.push(t);
                intensity.push(y);
            }
            // Header lines before the first numeric row.
            None if time.is_empty() => continue,
            None => {
                return Err(AnalysisError::load(format!(
                    "line {line}: expected numeric values in columns {} and {}",
                    opts.time_column + 1,
                    opts.intensity_column + 1
                )));
            }
        }
    }

    if time.is_empty() {
        return Err(AnalysisError::load("no numeric rows"));
    }

    Curve::new(time, intensity).map_err(AnalysisError::load)
}

fn parse_pair(record: &StringRecord, opts: &LoadOptions) -> Option<(f64, f64)> {
    let t = parse_f64(record.get(opts.time_column)?)?;
    let y = parse_f64(record.get(opts.intensity_column)?)?;
    Some((t, y))
}

fn parse_f64(field: &str) -> Option<f64> {
    // Excel exports sometimes prefix the first field with a BOM.
    let field = field.trim().trim_start_matches('\u{feff}');
    field.parse::<f64>().ok()
}
