//! Model evaluation for the single and double exponential decay.
//!
//! The fitter relies on four primitive operations:
//! - build a design row for a given time and fixed taus (linear solve)
//! - assemble the full parameter vector from taus + linear coefficients
//! - predict `y(t)` from a parameter vector (residuals, reports)
//! - fill a Jacobian row (Gauss-Newton refinement)
//!
//! Parameter layout follows `ModelKind::param_names`.

use crate::domain::ModelKind;
use crate::math::{decay, decay_dtau};

/// Fill a design row for the given model kind with the taus held fixed.
///
/// The row holds one decay column per tau followed by the constant column.
///
/// # Panics
/// Panics if `out` is shorter than `model.linear_len()` or `taus` is shorter
/// than `model.tau_len()`.
pub fn fill_design_row(model: ModelKind, t: f64, taus: &[f64], out: &mut [f64]) {
    match model {
        ModelKind::Single => {
            out[0] = decay(t, taus[0]);
            out[1] = 1.0;
        }
        ModelKind::Double => {
            out[0] = decay(t, taus[0]);
            out[1] = decay(t, taus[1]);
            out[2] = 1.0;
        }
    }
}

/// Interleave taus and linear coefficients into a parameter vector.
pub fn assemble_params(model: ModelKind, taus: &[f64], linear: &[f64]) -> Vec<f64> {
    match model {
        ModelKind::Single => vec![linear[0], taus[0], linear[1]],
        ModelKind::Double => vec![linear[0], taus[0], linear[1], taus[1], linear[2]],
    }
}

/// Predict `y(t)` for the given model kind.
pub fn predict(model: ModelKind, t: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::Single => params[0] * decay(t, params[1]) + params[2],
        ModelKind::Double => {
            params[0] * decay(t, params[1]) + params[2] * decay(t, params[3]) + params[4]
        }
    }
}

/// Fill `∂y(t)/∂p` for the given model kind.
pub fn fill_jacobian_row(model: ModelKind, t: f64, params: &[f64], out: &mut [f64]) {
    match model {
        ModelKind::Single => {
            out[0] = decay(t, params[1]);
            out[1] = params[0] * decay_dtau(t, params[1]);
            out[2] = 1.0;
        }
        ModelKind::Double => {
            out[0] = decay(t, params[1]);
            out[1] = params[0] * decay_dtau(t, params[1]);
            out[2] = decay(t, params[3]);
            out[3] = params[2] * decay_dtau(t, params[3]);
            out[4] = 1.0;
        }
    }
}

/// Put a double-exponential parameter vector in `tau1 < tau2` order.
///
/// The two terms are interchangeable, so the solver may converge with the
/// slow component first. Single-exponential vectors are returned unchanged.
pub fn canonicalize(model: ModelKind, mut params: Vec<f64>) -> Vec<f64> {
    if model == ModelKind::Double && params[1] > params[3] {
        params.swap(0, 2);
        params.swap(1, 3);
    }
    params
}
