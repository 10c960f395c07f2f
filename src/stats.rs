//! Robust distribution summary for lead counts.
//!
//! Lead activity is right-skewed: most hours see a handful of leads while a
//! few see spikes. Plain min-max scaling lets those spikes flatten the rest of
//! the gradient, so the scale is anchored on interpolated percentiles instead,
//! with an optional log1p compression when the sample looks skewed (or too
//! flat to separate visually).

use serde::Serialize;

/// Percentile snapshot of one strictly-positive sample.
///
/// When `log_applied` is true every field lives in log1p space, matching the
/// space the scaler will work in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionStats {
    pub p10: f64,
    pub p50: f64,
    pub p85: f64,
    pub p97: f64,
    pub min: f64,
    pub max: f64,
    pub log_applied: bool,
}

/// Interpolated order statistic over an ascending-sorted slice, `p` in 0..=100.
///
/// `index = p/100 * (n-1)`, linear blend between the two bracketing elements,
/// clamped to the last element when the upper bracket falls off the end.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let index = p.clamp(0.0, 100.0) / 100.0 * (n - 1) as f64;
    let lo = index.floor() as usize;
    let hi = index.ceil() as usize;
    if hi >= n {
        return sorted[n - 1];
    }
    let weight = index - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

/// Summarize a sample of strictly positive values. `None` when empty.
///
/// Callers must filter zeros out first: zero means "no activity", which is a
/// different state from "low activity" and must not drag the percentiles.
///
/// The raw-space percentiles only decide whether to compress; when they do,
/// every value is re-mapped through log1p and the returned stats are
/// recomputed in that space. The decision never reads transformed values.
pub fn summarize(values: &[f64]) -> Option<DistributionStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let raw = snapshot(&sorted, false);
    let skewed = raw.max / raw.min > 10.0 || raw.p85 - raw.p50 < 5.0;
    if !skewed {
        return Some(raw);
    }

    // log1p is monotonic, so the transformed sample is still sorted.
    let transformed: Vec<f64> = sorted.iter().map(|v| v.ln_1p()).collect();
    Some(snapshot(&transformed, true))
}

fn snapshot(sorted: &[f64], log_applied: bool) -> DistributionStats {
    DistributionStats {
        p10: percentile(sorted, 10.0),
        p50: percentile(sorted, 50.0),
        p85: percentile(sorted, 85.0),
        p97: percentile(sorted, 97.0),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        log_applied,
    }
}
