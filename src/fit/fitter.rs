//! Low-level fitting routine for a single decay region.
//!
//! Given:
//! - shifted times `t_i` (the peak sits at `t = 0`)
//! - observed intensities `y_i`
//! - a model kind
//!
//! we:
//! 1. search a tau grid, solving the linear amplitudes/offset by least squares
//!    for each candidate, and keep the lowest-SSE candidate as the initial
//!    guess
//! 2. refine all parameters jointly with Gauss-Newton (argmin)
//!
//! Step 1 makes the starting point deterministic and close to the optimum, so
//! step 2 rarely needs more than a handful of iterations. The solver works on
//! `ln(tau)` instead of `tau`, which keeps every decay constant positive
//! without constraints.

use std::time::Instant;

use argmin::core::{Error, Jacobian, Operator};
use log::debug;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::ModelKind;
use crate::error::AnalysisError;
use crate::fit::tau_grid::tau_grid_for;
use crate::math::{NlsOptions, gauss_newton, solve_least_squares};
use crate::models::{assemble_params, canonicalize, fill_design_row, fill_jacobian_row, predict};

/// Solver settings for one decay fit.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub max_iterations: usize,
    /// Absolute wall-clock deadline; `None` means unbounded.
    pub deadline: Option<Instant>,
}

/// A converged decay fit.
#[derive(Debug, Clone)]
pub struct DecayFit {
    pub model: ModelKind,
    /// Parameters in `ModelKind::param_names` order.
    pub params: Vec<f64>,
    pub sse: f64,
    pub rmse: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: Vec<f64>,
    sse: f64,
}

/// The decay model as a residual problem over `ln(tau)`-parameters.
struct DecayProblem<'a> {
    model: ModelKind,
    t: &'a [f64],
    y: &'a [f64],
}

impl DecayProblem<'_> {
    /// Solver vector to model parameters.
    fn model_params(&self, q: &DVector<f64>) -> Vec<f64> {
        let mut p: Vec<f64> = q.iter().copied().collect();
        for &i in self.model.tau_indices() {
            p[i] = p[i].exp();
        }
        p
    }

    /// Model parameters to solver vector.
    fn solver_params(&self, params: &[f64]) -> DVector<f64> {
        let mut q = DVector::from_column_slice(params);
        for &i in self.model.tau_indices() {
            q[i] = q[i].ln();
        }
        q
    }
}

impl Operator for DecayProblem<'_> {
    type Param = DVector<f64>;
    type Output = DVector<f64>;

    fn apply(&self, q: &Self::Param) -> Result<Self::Output, Error> {
        let p = self.model_params(q);
        Ok(DVector::from_iterator(
            self.t.len(),
            self.t
                .iter()
                .zip(self.y)
                .map(|(&t, &y)| predict(self.model, t, &p) - y),
        ))
    }
}

impl Jacobian for DecayProblem<'_> {
    type Param = DVector<f64>;
    type Jacobian = DMatrix<f64>;

    fn jacobian(&self, q: &Self::Param) -> Result<Self::Jacobian, Error> {
        let p = self.model_params(q);
        let k = self.model.param_count();
        let mut jac = DMatrix::zeros(self.t.len(), k);
        let mut row = vec![0.0; k];
        for (i, &t) in self.t.iter().enumerate() {
            fill_jacobian_row(self.model, t, &p, &mut row);
            // Chain rule: ∂/∂ln(tau) = tau · ∂/∂tau.
            for &j in self.model.tau_indices() {
                row[j] *= p[j];
            }
            for (j, v) in row.iter().enumerate() {
                jac[(i, j)] = *v;
            }
        }
        Ok(jac)
    }
}

/// Finite parameters with every tau positive.
fn is_physical(model: ModelKind, params: &[f64]) -> bool {
    params.iter().all(|v| v.is_finite()) && model.tau_indices().iter().all(|&i| params[i] > 0.0)
}

fn sse_of(model: ModelKind, t: &[f64], y: &[f64], params: &[f64]) -> f64 {
    t.iter()
        .zip(y)
        .map(|(&ti, &yi)| {
            let r = yi - predict(model, ti, params);
            r * r
        })
        .sum()
}

/// Fit `model` to the decay region `(t, y)`.
pub fn fit_decay(
    model: ModelKind,
    t: &[f64],
    y: &[f64],
    opts: &FitOptions,
) -> Result<DecayFit, AnalysisError> {
    let n = t.len();
    if n != y.len() {
        return Err(AnalysisError::fit("time and intensity lengths differ"));
    }
    if n < model.min_points() {
        return Err(AnalysisError::fit(format!(
            "only {n} samples after the peak; {} needs at least {}",
            model.display_name(),
            model.min_points()
        )));
    }

    let grid = tau_grid_for(model, t)?;
    let initial = grid_search(model, t, y, &grid, opts.deadline)?;
    if !is_physical(model, &initial.params) {
        return Err(AnalysisError::fit("grid search produced non-physical parameters"));
    }

    let problem = DecayProblem { model, t, y };
    let start = problem.solver_params(&initial.params);
    let nls_opts = NlsOptions {
        max_iterations: opts.max_iterations,
        deadline: opts.deadline,
        ..NlsOptions::default()
    };
    let solution = gauss_newton(problem, start, &nls_opts).map_err(|e| AnalysisError::fit(e.to_string()))?;

    let refined = DecayProblem { model, t, y }.model_params(&solution.params);
    let params = canonicalize(model, refined);
    if !is_physical(model, &params) {
        return Err(AnalysisError::fit("solver returned non-physical parameters"));
    }
    let sse = sse_of(model, t, y, &params);
    if !sse.is_finite() {
        return Err(AnalysisError::fit("non-finite residuals at the solution"));
    }

    debug!(
        "{}: grid start {:?} -> {:?} in {} iteration(s)",
        model.display_name(),
        initial.params,
        params,
        solution.iterations
    );

    Ok(DecayFit {
        model,
        params,
        sse,
        rmse: (sse / n as f64).sqrt(),
        iterations: solution.iterations,
    })
}

/// Evaluate every tau tuple (parallel) and return the best candidate.
fn grid_search(
    model: ModelKind,
    t: &[f64],
    y: &[f64],
    grid: &[Vec<f64>],
    deadline: Option<Instant>,
) -> Result<Candidate, AnalysisError> {
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, taus)| {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return None;
            }
            evaluate_candidate(model, taus, t, y).map(|(params, sse)| Candidate { idx, params, sse })
        })
        .collect();

    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Err(AnalysisError::fit("exceeded time budget during initial guess"));
    }

    // Deterministic selection: minimum SSE, ties broken by grid index.
    let mut iter = candidates.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(AnalysisError::fit(format!(
            "no valid initial guess for {}",
            model.display_name()
        )));
    };
    for c in iter {
        if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
            best = c;
        }
    }
    Ok(best)
}

fn evaluate_candidate(model: ModelKind, taus: &[f64], t: &[f64], y: &[f64]) -> Option<(Vec<f64>, f64)> {
    let n = t.len();
    let p = model.linear_len();

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &ti) in t.iter().enumerate() {
        fill_design_row(model, ti, taus, &mut row);
        for (j, v) in row.iter().enumerate() {
            x[(i, j)] = *v;
        }
    }
    let yv = DVector::from_column_slice(y);

    let linear = solve_least_squares(&x, &yv)?;
    let params = assemble_params(model, taus, linear.as_slice());
    let sse = sse_of(model, t, y, &params);

    sse.is_finite().then_some((params, sse))
}
