//! Export the result table.
//!
//! Delimited text (CSV/TSV) is meant to be easy to consume in spreadsheets or
//! downstream scripts; missing parameters are written as the configured
//! marker. JSON keeps the column order explicit and writes missing values as
//! `null`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::{Value, json};

use crate::domain::ExportFormat;
use crate::error::AppError;
use crate::report::{Cell, ResultTable};

/// Write `table` to `path` in `format`.
pub fn write_table(
    path: &Path,
    table: &ResultTable,
    format: ExportFormat,
    missing_marker: &str,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export '{}': {e}", path.display())))?;

    match format {
        ExportFormat::Csv => write_delimited(file, table, b',', missing_marker),
        ExportFormat::Tsv => write_delimited(file, table, b'\t', missing_marker),
        ExportFormat::Json => write_json(file, table),
    }
}

/// Write delimited text to any writer.
pub fn write_delimited<W: Write>(
    writer: W,
    table: &ResultTable,
    delimiter: u8,
    missing_marker: &str,
) -> Result<(), AppError> {
    let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).from_writer(writer);

    let columns = table.column_names();
    wtr.write_record(&columns)
        .map_err(|e| AppError::new(2, format!("Failed to write export header: {e}")))?;

    for r in 0..table.len() {
        let record: Vec<String> = columns
            .iter()
            .map(|column| match table.cell(column, r) {
                Some(Cell::Text(text)) => text.to_string(),
                Some(Cell::Number(Some(v))) => v.to_string(),
                Some(Cell::Number(None)) | None => missing_marker.to_string(),
            })
            .collect();
        wtr.write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export: {e}")))?;
    Ok(())
}

/// Write the table as `{model, columns, rows}` JSON.
pub fn write_json<W: Write>(writer: W, table: &ResultTable) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, &table_json(table))
        .map_err(|e| AppError::new(2, format!("Failed to write JSON export: {e}")))
}

fn table_json(table: &ResultTable) -> Value {
    let rows: Vec<Value> = table
        .files()
        .iter()
        .enumerate()
        .map(|(r, file)| {
            let mut row = vec![Value::from(file.as_str())];
            row.extend(table.row_parameters(r).into_iter().map(Value::from));
            Value::Array(row)
        })
        .collect();

    json!({
        "model": table.model(),
        "columns": table.column_names(),
        "rows": rows,
    })
}
