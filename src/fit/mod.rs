//! Curve fitting.
//!
//! Responsibilities:
//!
//! - detect peaks on the raw trace
//! - generate tau grids and pick a deterministic initial guess (parallel)
//! - refine with Gauss-Newton (argmin)
//! - tie it together per file (`analyze`)

pub mod analyze;
pub mod fitter;
pub mod peaks;
pub mod tau_grid;

pub use analyze::*;
pub use fitter::*;
pub use peaks::*;
pub use tau_grid::*;
