//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::batch::BatchRunOutcome;
use crate::domain::BatchConfig;
use crate::report::ResultTable;

const FILE_WIDTH: usize = 28;
const VALUE_WIDTH: usize = 12;

/// Run header: where we looked and what we fitted.
pub fn format_run_header(config: &BatchConfig, n_files: usize) -> String {
    let mut out = String::new();
    out.push_str("=== clfit - chemiluminescence decay fit ===\n");
    out.push_str(&format!(
        "Input: {} ({})\n",
        config.input_directory.display(),
        config.glob_pattern
    ));
    out.push_str(&format!(
        "Model: {} [{}]\n",
        config.model.display_name(),
        config.model.param_names().join(", ")
    ));
    out.push_str(&format!("Files: {n_files}\n"));
    out
}

/// The result table plus rmse and status columns.
pub fn format_results(table: &ResultTable, outcome: &BatchRunOutcome, missing_marker: &str) -> String {
    let mut out = String::new();
    let names = table.column_names();
    let params = &names[1..];

    let mut header = format!("{:<FILE_WIDTH$}", names[0]);
    for name in params {
        header.push_str(&format!(" {name:>VALUE_WIDTH$}"));
    }
    header.push_str(&format!(" {:>10} {:<12}", "rmse", "status"));
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<FILE_WIDTH$}", "");
    for _ in params {
        rule.push_str(&format!(" {:-<VALUE_WIDTH$}", ""));
    }
    rule.push_str(&format!(" {:-<10} {:-<12}", "", ""));
    out.push_str(&rule);
    out.push('\n');

    for (r, file) in table.files().iter().enumerate() {
        let mut line = format!("{:<FILE_WIDTH$}", truncate(file, FILE_WIDTH));
        for value in table.row_parameters(r) {
            line.push_str(&format!(" {:>VALUE_WIDTH$}", fmt_value(value, missing_marker)));
        }
        let (rmse, status) = match outcome.results.get(r).map(|row| &row.outcome) {
            Some(Ok(report)) => (format!("{:.3e}", report.quality.rmse), "ok"),
            Some(Err(err)) => (missing_marker.to_string(), err.label()),
            None => (missing_marker.to_string(), ""),
        };
        line.push_str(&format!(" {rmse:>10} {status:<12}"));
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Batch summary line, then one indented line per failed file.
pub fn format_summary(outcome: &BatchRunOutcome) -> String {
    let mut out = format!(
        "Fitted {} of {} file(s); {} need individual attention.",
        outcome.successes,
        outcome.results.len(),
        outcome.failures
    );
    for (file, err) in outcome.failed() {
        out.push_str(&format!("\n  {file}: {err}"));
    }
    out
}

fn fmt_value(value: Option<f64>, missing_marker: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.6}"),
        _ => missing_marker.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('~');
    out
}
