//! Input/output helpers.
//!
//! - input file discovery (`enumerate`)
//! - CSV trace ingest + validation (`ingest`)
//! - result table exports (CSV/TSV/JSON) (`export`)
//! - TOML run configuration (`config`)

pub mod config;
pub mod enumerate;
pub mod export;
pub mod ingest;

pub use config::*;
pub use enumerate::*;
pub use export::*;
pub use ingest::*;
