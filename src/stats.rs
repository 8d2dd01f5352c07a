// src/stats.rs
//
// Summary statistics engine.
// - OnlineStats: Welford running mean/variance + min/max.
// - percentile: linear-interpolated percentile on a sorted slice.
// - summarize: bootstrap percentile CI around the raw sample mean,
//   scaled to NIR per 1,000 exposures.
//
// Intentionally simple + deterministic.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct OnlineStats {
    n: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for OnlineStats {
    fn default() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl OnlineStats {
    pub fn from_slice(xs: &[f64]) -> Self {
        let mut s = Self::default();
        for &x in xs {
            s.add(x);
        }
        s
    }

    /// Adds a sample if finite. Non-finite samples are ignored.
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }

        self.n += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        // Welford online variance.
        let delta = x - self.mean;
        self.mean += delta / (self.n as f64);
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Population variance (divide by n).
    pub fn variance_population(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.m2 / (self.n as f64)
        }
    }

    /// Sample variance (divide by n-1).
    pub fn variance_sample(&self) -> f64 {
        if self.n <= 1 {
            0.0
        } else {
            self.m2 / ((self.n as f64) - 1.0)
        }
    }

    pub fn stddev_sample(&self) -> f64 {
        self.variance_sample().sqrt()
    }
}

/// Linear-interpolated percentile of a sorted slice; `p01` in [0, 1].
/// NaN on empty input.
pub fn percentile(sorted: &[f64], p01: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let p = p01.clamp(0.0, 1.0);
    let n = sorted.len();
    let idx = p * (n.saturating_sub(1) as f64);
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = idx - (lo as f64);
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

/// Point estimate + bootstrap CI for one arm, in NIR per 1,000 exposures.
/// Produced fresh per call; never cached.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryStatistics {
    /// Raw sample mean x 1000 (not the bootstrap mean).
    pub nir_per_1k: f64,
    /// Bootstrap percentile CI bounds, x 1000. NaN when the arm is empty.
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Confidence level of the interval (0.95).
    pub confidence: f64,
    /// Bootstrap replicate count used.
    pub replicates: usize,
    /// Underlying sample size (realized arm size).
    pub n: usize,
}

/// Confidence level of the reported intervals.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Bootstrap summary of one arm's per-exposure NIR vector.
///
/// Resamples `nir` with replacement to its own size `replicates` times on
/// a dedicated stream seeded from `bootstrap_seed`, takes the 2.5th and
/// 97.5th percentiles of the resample means as the 95% CI, and reports
/// the raw sample mean as the point estimate, all scaled x1000.
///
/// A zero-size arm (legitimate rare outcome of random assignment) yields
/// NaN point/CI rather than an error.
pub fn summarize(nir: &[f64], replicates: usize, bootstrap_seed: u64) -> SummaryStatistics {
    let n = nir.len();
    if n == 0 {
        return SummaryStatistics {
            nir_per_1k: f64::NAN,
            ci_lower: f64::NAN,
            ci_upper: f64::NAN,
            confidence: CONFIDENCE_LEVEL,
            replicates,
            n,
        };
    }

    let sample_mean = nir.iter().sum::<f64>() / (n as f64);

    let mut rng = ChaCha8Rng::seed_from_u64(bootstrap_seed);
    let mut means = Vec::with_capacity(replicates);
    for _ in 0..replicates {
        let mut acc = 0.0;
        for _ in 0..n {
            acc += nir[rng.gen_range(0..n)];
        }
        means.push(acc / (n as f64));
    }
    means.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let alpha_half = (1.0 - CONFIDENCE_LEVEL) / 2.0;
    SummaryStatistics {
        nir_per_1k: sample_mean * 1_000.0,
        ci_lower: percentile(&means, alpha_half) * 1_000.0,
        ci_upper: percentile(&means, 1.0 - alpha_half) * 1_000.0,
        confidence: CONFIDENCE_LEVEL,
        replicates,
        n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_stats_basic() {
        let s = OnlineStats::from_slice(&[1.0, 2.0, 3.0]);

        assert_eq!(s.n(), 3);
        assert!((s.mean() - 2.0).abs() < 1e-12);

        // Population variance for [1,2,3] is 2/3; sample variance is 1.
        assert!((s.variance_population() - (2.0 / 3.0)).abs() < 1e-12);
        assert!((s.variance_sample() - 1.0).abs() < 1e-12);

        assert_eq!(s.min(), 1.0);
        assert_eq!(s.max(), 3.0);
    }

    #[test]
    fn online_stats_ignores_non_finite() {
        let s = OnlineStats::from_slice(&[1.0, f64::NAN, f64::INFINITY, 3.0]);
        assert_eq!(s.n(), 2);
        assert!((s.mean() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn percentile_interpolates() {
        let xs = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&xs, 0.0), 10.0);
        assert_eq!(percentile(&xs, 1.0), 50.0);
        assert_eq!(percentile(&xs, 0.5), 30.0);
        assert!((percentile(&xs, 0.25) - 20.0).abs() < 1e-12);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn point_estimate_is_raw_mean_times_1000() {
        let nir = [0.5, -1.5, 2.0, 0.0];
        let s = summarize(&nir, 200, 9);
        assert!((s.nir_per_1k - 0.25 * 1_000.0).abs() < 1e-9);
        assert_eq!(s.n, 4);
        assert_eq!(s.replicates, 200);
    }

    #[test]
    fn bootstrap_is_deterministic_per_seed() {
        let nir: Vec<f64> = (0..500).map(|i| ((i * 37) % 11) as f64 - 5.0).collect();
        let a = summarize(&nir, 400, 123);
        let b = summarize(&nir, 400, 123);
        assert_eq!(a.ci_lower.to_bits(), b.ci_lower.to_bits());
        assert_eq!(a.ci_upper.to_bits(), b.ci_upper.to_bits());

        let c = summarize(&nir, 400, 124);
        assert!(a.ci_lower != c.ci_lower || a.ci_upper != c.ci_upper);
    }

    #[test]
    fn ci_brackets_point_estimate_on_well_behaved_data() {
        let nir: Vec<f64> = (0..1_000).map(|i| ((i % 7) as f64) - 3.0).collect();
        let s = summarize(&nir, 500, 5);
        assert!(s.ci_lower <= s.nir_per_1k);
        assert!(s.nir_per_1k <= s.ci_upper);
        assert!(s.ci_upper > s.ci_lower);
    }

    #[test]
    fn empty_arm_reports_nan_not_panic() {
        let s = summarize(&[], 100, 1);
        assert!(s.nir_per_1k.is_nan());
        assert!(s.ci_lower.is_nan());
        assert!(s.ci_upper.is_nan());
        assert_eq!(s.n, 0);
    }
}
