//! Single-file analysis: peaks → decay region → fit.
//!
//! Pure computation. Reporting a failure to the operator is the batch
//! orchestrator's job.

use std::time::Instant;

use crate::domain::{AnalysisOptions, Curve, FitParameters, FitQuality, FitReport};
use crate::error::AnalysisError;
use crate::fit::fitter::{FitOptions, fit_decay};
use crate::fit::peaks::find_peaks;

/// Analyze one curve.
///
/// Fits the region from the last detected peak to the end of the trace. The
/// time budget (if any) starts when this function is called.
pub fn analyze(curve: &Curve, opts: &AnalysisOptions) -> Result<FitReport, AnalysisError> {
    let deadline = opts.fit_timeout.map(|budget| Instant::now() + budget);

    let peaks = find_peaks(curve.intensity(), &opts.peaks);
    let Some(&peak_index) = peaks.last() else {
        return Err(AnalysisError::NoPeaksFound);
    };

    let (t, y) = curve.decay_region(peak_index);
    let fit = fit_decay(
        opts.model,
        &t,
        &y,
        &FitOptions {
            max_iterations: opts.max_iterations,
            deadline,
        },
    )?;

    Ok(FitReport {
        params: FitParameters {
            model: fit.model,
            values: fit.params,
        },
        quality: FitQuality {
            sse: fit.sse,
            rmse: fit.rmse,
            n: t.len(),
            iterations: fit.iterations,
        },
        n_peaks: peaks.len(),
        peak_index,
        peak_time: curve.time()[peak_index],
    })
}
