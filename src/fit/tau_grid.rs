//! Tau grid generation.
//!
//! The initial guess for every fit comes from a deterministic grid search over
//! decay constants: for each candidate tau tuple the amplitudes and offset are
//! a linear least squares problem. The grid spans the time resolution of the
//! decay region up to well beyond its extent.

use crate::domain::ModelKind;
use crate::error::AnalysisError;

/// Grid points for the single exponential.
pub const SINGLE_STEPS: usize = 60;
/// Grid points per dimension for the double exponential.
pub const DOUBLE_STEPS: usize = 25;
/// Minimum `tau2 / tau1` for double-exponential candidates.
pub const DOUBLE_MIN_RATIO: f64 = 1.5;
/// Upper grid bound as a multiple of the decay region's time span.
const SPAN_MULTIPLE: f64 = 10.0;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AnalysisError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AnalysisError::fit(format!(
            "invalid tau range: min={min}, max={max}"
        )));
    }
    if steps < 2 {
        return Err(AnalysisError::fit("tau grid needs at least 2 steps"));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// Tau search bounds for a decay region with shifted time `t` (ascending,
/// starting at 0): the smallest sample spacing up to ten times the span.
pub fn tau_bounds(t: &[f64]) -> Result<(f64, f64), AnalysisError> {
    let span = match (t.first(), t.last()) {
        (Some(first), Some(last)) => last - first,
        _ => return Err(AnalysisError::fit("empty decay region")),
    };
    let min_dt = t
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);
    if !(span > 0.0 && min_dt.is_finite()) {
        return Err(AnalysisError::fit("decay region has no time extent"));
    }
    Ok((min_dt, span * SPAN_MULTIPLE))
}

/// Single-exponential grid: `[τ]`.
pub fn tau_grid_single(min: f64, max: f64, steps: usize) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let values = log_space(min, max, steps)?;
    Ok(values.into_iter().map(|t| vec![t]).collect())
}

/// Double-exponential grid: `[τ1, τ2]` with `τ2 >= τ1 · min_ratio`.
pub fn tau_grid_double(
    min: f64,
    max: f64,
    steps: usize,
    min_ratio: f64,
) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let values = log_space(min, max, steps)?;
    let min_ratio = min_ratio.max(1.0);
    let mut out = Vec::new();
    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            if values[j] >= values[i] * min_ratio {
                out.push(vec![values[i], values[j]]);
            }
        }
    }
    Ok(out)
}

/// The default grid for `model` over a decay region with time `t`.
pub fn tau_grid_for(model: ModelKind, t: &[f64]) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let (min, max) = tau_bounds(t)?;
    match model {
        ModelKind::Single => tau_grid_single(min, max, SINGLE_STEPS),
        ModelKind::Double => tau_grid_double(min, max, DOUBLE_STEPS, DOUBLE_MIN_RATIO),
    }
}
