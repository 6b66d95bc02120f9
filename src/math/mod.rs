//! Mathematical utilities: decay basis, linear and nonlinear least squares.

pub mod basis;
pub mod nls;
pub mod ols;

pub use basis::*;
pub use nls::*;
pub use ols::*;
