//! The batch result table.
//!
//! One row per enumerated file, keyed by file name. Columns are `File`
//! followed by the model's parameters in `ModelKind::param_names` order.
//! Failed files keep their row with every parameter missing (`None`), so the
//! table doubles as a list of files that need manual follow-up.

use crate::domain::{BatchResult, ModelKind};

/// Name of the key column.
pub const FILE_COLUMN: &str = "File";

/// Immutable column-oriented table, built once from the batch accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    model: ModelKind,
    files: Vec<String>,
    /// `parameters[c][r]`: parameter column `c`, row `r`.
    parameters: Vec<Vec<Option<f64>>>,
}

/// A single cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(Option<f64>),
}

impl ResultTable {
    /// Build the table from batch rows, preserving their order.
    pub fn build(model: ModelKind, results: &[BatchResult]) -> Self {
        let names = model.param_names();
        let mut parameters = vec![Vec::with_capacity(results.len()); names.len()];
        let mut files = Vec::with_capacity(results.len());

        for row in results {
            files.push(row.file.clone());
            let fitted = row
                .outcome
                .as_ref()
                .ok()
                .filter(|report| report.params.model == model);
            for (c, column) in parameters.iter_mut().enumerate() {
                column.push(fitted.and_then(|report| report.params.values.get(c).copied()));
            }
        }

        Self {
            model,
            files,
            parameters,
        }
    }

    pub fn model(&self) -> ModelKind {
        self.model
    }

    /// Column names, key column first.
    pub fn column_names(&self) -> Vec<&'static str> {
        std::iter::once(FILE_COLUMN)
            .chain(self.model.param_names().iter().copied())
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The `File` column.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// A parameter column by name.
    pub fn parameter(&self, name: &str) -> Option<&[Option<f64>]> {
        self.model
            .param_names()
            .iter()
            .position(|n| *n == name)
            .map(|c| self.parameters[c].as_slice())
    }

    /// Parameter values of row `r`, in column order.
    pub fn row_parameters(&self, r: usize) -> Vec<Option<f64>> {
        self.parameters.iter().map(|col| col[r]).collect()
    }

    /// Cell at (`column`, `row`).
    pub fn cell(&self, column: &str, row: usize) -> Option<Cell<'_>> {
        if column == FILE_COLUMN {
            return self.files.get(row).map(|f| Cell::Text(f));
        }
        self.parameter(column)
            .and_then(|col| col.get(row))
            .map(|v| Cell::Number(*v))
    }

    /// Whether row `r` has every parameter populated.
    pub fn is_complete(&self, r: usize) -> bool {
        self.parameters.iter().all(|col| col[r].is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{FitParameters, FitQuality, FitReport};
    use crate::error::AnalysisError;

    fn ok(file: &str, values: Vec<f64>) -> BatchResult {
        BatchResult {
            file: file.to_string(),
            path: PathBuf::from(file),
            outcome: Ok(FitReport {
                params: FitParameters {
                    model: ModelKind::Single,
                    values,
                },
                quality: FitQuality {
                    sse: 0.0,
                    rmse: 0.0,
                    n: 10,
                    iterations: 3,
                },
                n_peaks: 1,
                peak_index: 0,
                peak_time: 0.0,
            }),
        }
    }

    fn failed(file: &str, err: AnalysisError) -> BatchResult {
        BatchResult {
            file: file.to_string(),
            path: PathBuf::from(file),
            outcome: Err(err),
        }
    }

    #[test]
    fn failed_rows_are_kept_with_missing_markers() {
        let rows = vec![
            ok("a.csv", vec![1.0, 2.0, 3.0]),
            failed("b.csv", AnalysisError::NoPeaksFound),
            ok("c.csv", vec![4.0, 5.0, 6.0]),
        ];
        let table = ResultTable::build(ModelKind::Single, &rows);

        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["File", "A", "tau", "C"]);
        assert_eq!(table.files(), &["a.csv", "b.csv", "c.csv"]);
        assert_eq!(table.parameter("tau").unwrap(), &[Some(2.0), None, Some(5.0)]);
        assert!(table.is_complete(0));
        assert!(!table.is_complete(1));
        assert_eq!(table.row_parameters(1), vec![None, None, None]);
    }

    #[test]
    fn cells_by_column_name() {
        let table = ResultTable::build(ModelKind::Single, &[ok("a.csv", vec![1.0, 2.0, 3.0])]);
        assert_eq!(table.cell("File", 0), Some(Cell::Text("a.csv")));
        assert_eq!(table.cell("C", 0), Some(Cell::Number(Some(3.0))));
        assert_eq!(table.cell("C", 1), None);
        assert_eq!(table.cell("nope", 0), None);
    }

    #[test]
    fn empty_batch_builds_empty_table() {
        let table = ResultTable::build(ModelKind::Double, &[]);
        assert!(table.is_empty());
        assert_eq!(table.column_names().len(), 6);
    }
}
