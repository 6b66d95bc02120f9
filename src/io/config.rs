//! TOML run configuration.
//!
//! Every key is optional; missing keys take `BatchConfig::default()` values.
//!
//! ```toml
//! input_directory = "data/run-07"
//! glob_pattern = "*_CL_T*.csv"
//! model = "single"
//! min_prominence = 0.25
//! export = "results.csv"
//! ```

use std::fs;
use std::path::Path;

use crate::domain::BatchConfig;
use crate::error::AppError;

/// Read a `BatchConfig` from a TOML file.
pub fn read_config(path: &Path) -> Result<BatchConfig, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
    toml::from_str(&text)
        .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
}
