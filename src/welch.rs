// src/welch.rs
//
// Welch's two-sample t-test (unequal variances, unequal sizes) on the two
// arms' per-exposure NIR vectors. Arms are randomly sized by assignment,
// so equal-n / pooled-variance shortcuts are off the table.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::stats::OnlineStats;

/// Result of Welch's t-test between two arms.
///
/// Degenerate inputs (an arm smaller than 2, zero pooled standard error)
/// produce NaN / infinite statistics rather than an error; the caller is
/// responsible for interpreting degenerate p-values.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WelchResult {
    /// t = (mean_b - mean_a) / sqrt(var_a/n_a + var_b/n_b).
    pub t_statistic: f64,
    /// Welch-Satterthwaite degrees of freedom.
    pub df: f64,
    /// Two-sided p-value from the Student-t distribution.
    pub p_value: f64,
    pub mean_a: f64,
    pub mean_b: f64,
    pub n_a: usize,
    pub n_b: usize,
}

/// Welch's t-test of arm B against arm A.
pub fn compare_arms(arm_a: &[f64], arm_b: &[f64]) -> WelchResult {
    let sa = OnlineStats::from_slice(arm_a);
    let sb = OnlineStats::from_slice(arm_b);

    let n_a = sa.n() as f64;
    let n_b = sb.n() as f64;
    let mean_a = sa.mean();
    let mean_b = sb.mean();

    let degenerate = |t: f64| WelchResult {
        t_statistic: t,
        df: f64::NAN,
        p_value: f64::NAN,
        mean_a,
        mean_b,
        n_a: arm_a.len(),
        n_b: arm_b.len(),
    };

    if n_a < 2.0 || n_b < 2.0 {
        return degenerate(f64::NAN);
    }

    let var_a = sa.variance_sample();
    let var_b = sb.variance_sample();

    let se2 = var_a / n_a + var_b / n_b;
    let diff = mean_b - mean_a;

    if se2 <= 0.0 {
        // Zero variance in both arms: identical constants give t = 0/0,
        // any real difference gives t = +/-inf.
        let t = if diff == 0.0 {
            f64::NAN
        } else {
            diff.signum() * f64::INFINITY
        };
        return degenerate(t);
    }

    let t = diff / se2.sqrt();

    // Welch-Satterthwaite approximation.
    let df = se2 * se2
        / ((var_a / n_a).powi(2) / (n_a - 1.0) + (var_b / n_b).powi(2) / (n_b - 1.0));

    let p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    };

    WelchResult {
        t_statistic: t,
        df,
        p_value,
        mean_a,
        mean_b,
        n_a: arm_a.len(),
        n_b: arm_b.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_checked_fixture() {
        // a = [1..5], b = [2..6]: means 3 and 4, sample variance 2.5 each,
        // se = sqrt(0.5 + 0.5) = 1, t = 1, df = 8, two-sided p ~ 0.3466.
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 3.0, 4.0, 5.0, 6.0];
        let r = compare_arms(&a, &b);

        assert!((r.t_statistic - 1.0).abs() < 1e-12);
        assert!((r.df - 8.0).abs() < 1e-9);
        assert!((r.p_value - 0.3466).abs() < 5e-3);
        assert_eq!(r.n_a, 5);
        assert_eq!(r.n_b, 5);
    }

    #[test]
    fn symmetric_in_sign() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let fwd = compare_arms(&a, &b);
        let rev = compare_arms(&b, &a);
        assert!((fwd.t_statistic + rev.t_statistic).abs() < 1e-12);
        assert!((fwd.p_value - rev.p_value).abs() < 1e-12);
        assert!(fwd.t_statistic > 0.0);
    }

    #[test]
    fn handles_unequal_sizes() {
        let a: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..200).map(|i| (i as f64) * 0.5 + 40.0).collect();
        let r = compare_arms(&a, &b);
        assert!(r.t_statistic.is_finite());
        assert!(r.df > 1.0);
        assert!((0.0..=1.0).contains(&r.p_value));
    }

    #[test]
    fn degenerate_tiny_arm_yields_nan() {
        let r = compare_arms(&[1.0], &[2.0, 3.0, 4.0]);
        assert!(r.t_statistic.is_nan());
        assert!(r.p_value.is_nan());
    }

    #[test]
    fn degenerate_zero_variance_yields_infinite_or_nan_t() {
        let r = compare_arms(&[2.0, 2.0, 2.0], &[5.0, 5.0, 5.0]);
        assert!(r.t_statistic.is_infinite() && r.t_statistic > 0.0);
        assert!(r.p_value.is_nan());

        let r = compare_arms(&[2.0, 2.0, 2.0], &[2.0, 2.0, 2.0]);
        assert!(r.t_statistic.is_nan());
    }
}
