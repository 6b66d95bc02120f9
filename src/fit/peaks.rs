//! Peak detection on the intensity trace.
//!
//! Candidates are strict interior local maxima (a flat top counts once, at its
//! middle sample; the first and last samples never count). Candidates are then
//! filtered, in order, by absolute height, by minimum separation, and by
//! topographic prominence. A peak must clear two prominence floors: a fraction
//! of the curve's total range, and a fraction of the most prominent
//! candidate's prominence.
//!
//! Prominence of a peak is its height above the higher of the two lowest
//! points reachable on either side before meeting a higher sample (or the
//! curve's edge). The injection peak has prominence close to the full range.
//! A noise spike on the decay tail sits between noise troughs, so its
//! prominence scales with the noise amplitude, which on a noisy trace can
//! reach the range floor but stays well under half the injection peak.

use crate::domain::{PeakOptions, PeakSet};

/// Detect peaks in `y` according to `opts`.
pub fn find_peaks(y: &[f64], opts: &PeakOptions) -> PeakSet {
    let mut peaks = local_maxima(y);

    if let Some(min_height) = opts.min_height {
        peaks.retain(|&i| y[i] >= min_height);
    }

    if opts.min_distance > 1 {
        peaks = select_by_distance(y, &peaks, opts.min_distance);
    }

    let (lo, hi) = y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;
    if !(range.is_finite() && range > 0.0) {
        return Vec::new();
    }
    let prominences: Vec<f64> = peaks.iter().map(|&i| prominence(y, i)).collect();
    let dominant = prominences.iter().copied().fold(0.0, f64::max);
    let threshold = (opts.min_prominence.max(0.0) * range)
        .max(opts.relative_prominence.clamp(0.0, 1.0) * dominant);

    peaks
        .into_iter()
        .zip(prominences)
        .filter_map(|(i, p)| (p > 0.0 && p >= threshold).then_some(i))
        .collect()
}

/// Interior local maxima, plateaus collapsed to their midpoint.
fn local_maxima(y: &[f64]) -> Vec<usize> {
    let n = y.len();
    let mut out = Vec::new();
    if n < 3 {
        return out;
    }

    let mut i = 1;
    while i < n - 1 {
        if y[i - 1] < y[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && y[ahead] == y[i] {
                ahead += 1;
            }
            if y[ahead] < y[i] {
                out.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Keep the highest peaks such that no two kept peaks are closer than
/// `distance` samples. Ties keep the earlier peak.
fn select_by_distance(y: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        y[peaks[b]]
            .partial_cmp(&y[peaks[a]])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; peaks.len()];
    for &k in &order {
        if !keep[k] {
            continue;
        }
        for (j, &p) in peaks.iter().enumerate() {
            if j != k && keep[j] && p.abs_diff(peaks[k]) < distance {
                keep[j] = false;
            }
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

fn prominence(y: &[f64], peak: usize) -> f64 {
    let height = y[peak];

    let mut left_min = height;
    for &v in y[..peak].iter().rev() {
        if v > height {
            break;
        }
        left_min = left_min.min(v);
    }

    let mut right_min = height;
    for &v in &y[peak + 1..] {
        if v > height {
            break;
        }
        right_min = right_min.min(v);
    }

    height - left_min.max(right_min)
}
