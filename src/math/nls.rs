//! Nonlinear least squares refinement.
//!
//! Wraps argmin's Gauss-Newton solver for problems that expose a residual
//! vector (`Operator`) and its Jacobian (`Jacobian`) over nalgebra vectors.
//! Each iteration solves the normal equations
//!
//! ```text
//! (JᵀJ) δ = -Jᵀr
//! ```
//!
//! so the starting point has to be close; callers seed it from a grid search.
//! Only a solver-declared convergence counts as success: hitting the
//! iteration cap, running out of time, or a singular `JᵀJ` are failures.

use std::time::Instant;

use argmin::core::{Executor, Jacobian, Operator, State, TerminationReason};
use argmin::solver::gaussnewton::GaussNewton;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Solver settings.
#[derive(Debug, Clone)]
pub struct NlsOptions {
    pub max_iterations: usize,
    /// Converged when successive residual norms differ by less than this.
    pub tolerance: f64,
    pub deadline: Option<Instant>,
}

impl Default for NlsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-10,
            deadline: None,
        }
    }
}

/// A converged solution.
#[derive(Debug, Clone)]
pub struct NlsSolution {
    pub params: DVector<f64>,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NlsFailure {
    #[error("no convergence after {0} iterations")]
    MaxIterations(usize),
    #[error("exceeded time budget")]
    TimedOut,
    #[error("solver stopped early ({0})")]
    Stopped(String),
    #[error("solver error: {0}")]
    Solver(String),
}

/// Refine `initial` with Gauss-Newton.
pub fn gauss_newton<O>(problem: O, initial: DVector<f64>, opts: &NlsOptions) -> Result<NlsSolution, NlsFailure>
where
    O: Operator<Param = DVector<f64>, Output = DVector<f64>>
        + Jacobian<Param = DVector<f64>, Jacobian = DMatrix<f64>>,
{
    let solver = GaussNewton::<f64>::new()
        .with_tolerance(opts.tolerance)
        .map_err(|e| NlsFailure::Solver(e.to_string()))?;

    let max_iters = opts.max_iterations as u64;
    let mut executor =
        Executor::new(problem, solver).configure(|state| state.param(initial).max_iters(max_iters));
    if let Some(deadline) = opts.deadline {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(NlsFailure::TimedOut);
        }
        executor = executor.timeout(remaining);
    }

    let result = executor.run().map_err(|e| NlsFailure::Solver(e.to_string()))?;
    let state = result.state();

    match state.get_termination_reason() {
        Some(TerminationReason::SolverConverged) | Some(TerminationReason::TargetCostReached) => {}
        Some(TerminationReason::MaxItersReached) => {
            return Err(NlsFailure::MaxIterations(opts.max_iterations));
        }
        Some(TerminationReason::Timeout) => return Err(NlsFailure::TimedOut),
        other => return Err(NlsFailure::Stopped(format!("{other:?}"))),
    }

    let params = state
        .get_param()
        .cloned()
        .ok_or_else(|| NlsFailure::Solver("solver returned no parameters".to_string()))?;

    Ok(NlsSolution {
        params,
        iterations: state.get_iter() as usize,
    })
}

#[cfg(test)]
mod tests {
    use argmin::core::Error;

    use super::*;

    /// Fit `y = a·exp(b·x)` to exact data.
    struct ExpGrowth {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl Operator for ExpGrowth {
        type Param = DVector<f64>;
        type Output = DVector<f64>;

        fn apply(&self, p: &Self::Param) -> Result<Self::Output, Error> {
            Ok(DVector::from_iterator(
                self.x.len(),
                self.x
                    .iter()
                    .zip(&self.y)
                    .map(|(&x, &y)| p[0] * (p[1] * x).exp() - y),
            ))
        }
    }

    impl Jacobian for ExpGrowth {
        type Param = DVector<f64>;
        type Jacobian = DMatrix<f64>;

        fn jacobian(&self, p: &Self::Param) -> Result<Self::Jacobian, Error> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, &x) in self.x.iter().enumerate() {
                let e = (p[1] * x).exp();
                j[(i, 0)] = e;
                j[(i, 1)] = p[0] * x * e;
            }
            Ok(j)
        }
    }

    fn problem() -> ExpGrowth {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|&x| 3.0 * (0.7 * x).exp()).collect();
        ExpGrowth { x, y }
    }

    #[test]
    fn converges_on_exact_data() {
        let sol = gauss_newton(
            problem(),
            DVector::from_row_slice(&[2.5, 0.6]),
            &NlsOptions::default(),
        )
        .unwrap();
        assert!((sol.params[0] - 3.0).abs() < 1e-6, "{:?}", sol.params);
        assert!((sol.params[1] - 0.7).abs() < 1e-6, "{:?}", sol.params);
        assert!(sol.iterations >= 1);
    }

    #[test]
    fn reports_iteration_cap() {
        let opts = NlsOptions {
            max_iterations: 1,
            ..NlsOptions::default()
        };
        let err = gauss_newton(problem(), DVector::from_row_slice(&[2.5, 0.6]), &opts).unwrap_err();
        assert_eq!(err, NlsFailure::MaxIterations(1));
    }

    #[test]
    fn expired_deadline_times_out() {
        let opts = NlsOptions {
            deadline: Some(Instant::now()),
            ..NlsOptions::default()
        };
        let err = gauss_newton(problem(), DVector::from_row_slice(&[2.5, 0.6]), &opts).unwrap_err();
        assert_eq!(err, NlsFailure::TimedOut);
    }
}
