//! Synthetic chemiluminescence traces.
//!
//! Each trace is a flat baseline, a short linear rise to the injection peak,
//! then a single exponential decay, all with additive Gaussian noise. Used by
//! the `synth` command to produce demo datasets and by tests that need noisy
//! curves with known parameters.

use std::fs;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::Serialize;

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::models::predict;

/// Shape of a generated trace.
#[derive(Debug, Clone)]
pub struct TraceShape {
    /// Total samples.
    pub samples: usize,
    /// Sample spacing.
    pub dt: f64,
    /// Samples of flat baseline before the rise starts.
    pub baseline_samples: usize,
    /// Samples from rise start to the peak.
    pub rise_samples: usize,
    /// Gaussian noise standard deviation.
    pub noise: f64,
}

impl Default for TraceShape {
    fn default() -> Self {
        Self {
            samples: 600,
            dt: 0.02,
            baseline_samples: 50,
            rise_samples: 5,
            noise: 0.005,
        }
    }
}

/// Settings for the `synth` command.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub out_dir: PathBuf,
    pub prefix: String,
    pub count: usize,
    pub seed: u64,
    /// Every k-th file is a flat baseline (no peak).
    pub flat_every: Option<usize>,
    pub shape: TraceShape,
}

/// One generated file and the parameters it was drawn with.
#[derive(Debug, Clone)]
pub struct SynthFile {
    pub path: PathBuf,
    /// `[A, tau, C]`, or `None` for a flat trace.
    pub params: Option<[f64; 3]>,
}

#[derive(Serialize)]
struct Row {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "Intensity")]
    intensity: f64,
}

/// A noisy single-exponential pulse with parameters `[A, tau, C]`.
///
/// The peak sits at sample `baseline_samples + rise_samples`; decay time is
/// measured from there.
pub fn decay_trace<R: Rng>(
    params: [f64; 3],
    shape: &TraceShape,
    rng: &mut R,
) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let noise = noise_dist(shape.noise)?;
    let peak = shape.baseline_samples + shape.rise_samples;
    let [a, _, c] = params;

    let mut time = Vec::with_capacity(shape.samples);
    let mut intensity = Vec::with_capacity(shape.samples);
    for i in 0..shape.samples {
        let t = i as f64 * shape.dt;
        let clean = if i < shape.baseline_samples {
            c
        } else if i < peak {
            let frac = (i - shape.baseline_samples) as f64 / shape.rise_samples.max(1) as f64;
            c + a * frac * 0.8
        } else {
            predict(ModelKind::Single, t - peak as f64 * shape.dt, &params)
        };
        time.push(t);
        intensity.push(clean + noise.sample(rng));
    }
    Ok((time, intensity))
}

/// A constant baseline at level `c`: a trace where the injection never fired.
///
/// Noise-free: prominence is relative to the trace range, so noise alone
/// would pass as peaks.
pub fn flat_trace(c: f64, shape: &TraceShape) -> (Vec<f64>, Vec<f64>) {
    let time = (0..shape.samples).map(|i| i as f64 * shape.dt).collect();
    (time, vec![c; shape.samples])
}

/// Write `config.count` traces named `<prefix>_CL_T<n>.csv` (n from 1).
pub fn write_synthetic_dataset(config: &SynthConfig) -> Result<Vec<SynthFile>, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    if config.shape.samples < config.shape.baseline_samples + config.shape.rise_samples + 2 {
        return Err(AppError::new(2, "Trace is too short for its baseline and rise."));
    }
    fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(2, format!("Failed to create '{}': {e}", config.out_dir.display()))
    })?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut out = Vec::with_capacity(config.count);

    for n in 1..=config.count {
        let path = config.out_dir.join(format!("{}_CL_T{n}.csv", config.prefix));
        let flat = config.flat_every.is_some_and(|k| k > 0 && n % k == 0);

        let c = rng.gen_range(0.0..=0.1);
        let (params, (time, intensity)) = if flat {
            (None, flat_trace(c, &config.shape))
        } else {
            let a = rng.gen_range(0.5..=2.0);
            let tau = rng.gen_range(0.5..=3.0);
            let p = [a, tau, c];
            (Some(p), decay_trace(p, &config.shape, &mut rng)?)
        };

        write_trace(&path, &time, &intensity)?;
        out.push(SynthFile { path, params });
    }

    Ok(out)
}

/// Write one trace as a headered two-column CSV.
pub fn write_trace(path: &Path, time: &[f64], intensity: &[f64]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    for (&time, &intensity) in time.iter().zip(intensity) {
        wtr.serialize(Row { time, intensity })
            .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    }
    wtr.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    Ok(())
}

fn noise_dist(sigma: f64) -> Result<Normal<f64>, AppError> {
    Normal::new(0.0, sigma).map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PeakOptions;
    use crate::fit::find_peaks;

    #[test]
    fn decay_trace_peaks_where_expected() {
        let mut rng = StdRng::seed_from_u64(7);
        let shape = TraceShape::default();
        let (_, y) = decay_trace([1.0, 1.23, 0.0], &shape, &mut rng).unwrap();
        let peaks = find_peaks(&y, &PeakOptions::default());
        let expected = shape.baseline_samples + shape.rise_samples;
        let last = *peaks.last().unwrap();
        assert!(last.abs_diff(expected) <= 2, "peaks={peaks:?}");
    }

    #[test]
    fn same_seed_same_trace() {
        let shape = TraceShape::default();
        let a = decay_trace([1.0, 1.0, 0.0], &shape, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = decay_trace([1.0, 1.0, 0.0], &shape, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn negative_noise_is_rejected() {
        let shape = TraceShape {
            noise: -1.0,
            ..TraceShape::default()
        };
        assert!(decay_trace([1.0, 1.0, 0.0], &shape, &mut StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn flat_trace_has_no_peaks() {
        let (_, y) = flat_trace(0.05, &TraceShape::default());
        assert!(find_peaks(&y, &PeakOptions::default()).is_empty());
    }
}
