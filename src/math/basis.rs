//! Exponential decay basis.
//!
//! Both models are sums of terms `exp(-t/τ)` plus a constant, so the fitter
//! only needs the term itself and its derivative with respect to `τ`:
//!
//! - `g(t, τ) = exp(-t/τ)`
//! - `∂g/∂τ = g(t, τ) · t / τ²`
//!
//! `τ` is assumed positive; callers reject non-positive candidates before
//! evaluating.

/// Smallest `τ` we evaluate; guards the division.
const TAU_EPS: f64 = 1e-300;

/// Compute `exp(-t/τ)`.
pub fn decay(t: f64, tau: f64) -> f64 {
    (-t / tau.max(TAU_EPS)).exp()
}

/// Compute `∂/∂τ exp(-t/τ)`.
pub fn decay_dtau(t: f64, tau: f64) -> f64 {
    let tau = tau.max(TAU_EPS);
    decay(t, tau) * t / (tau * tau)
}
