//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw samples (`Curve`, `PeakSet`)
//! - fit outputs (`FitParameters`, `FitQuality`, `FitReport`)
//! - batch rows (`BatchResult`) and run configuration (`BatchConfig`)

pub mod types;

pub use types::*;
