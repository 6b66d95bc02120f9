//! Linear least squares solver.
//!
//! With the decay constants held fixed, both decay models are linear in their
//! amplitudes and offset:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2,   x_i = [exp(-t_i/τ1), ..., 1]
//! ```
//!
//! The tau grid search solves this once per candidate, so it must tolerate the
//! nearly collinear columns that appear when `τ` is far larger than the
//! sampled time span (the decay term flattens into the offset column).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() || x.nrows() != y.len() {
        return None;
    }
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
