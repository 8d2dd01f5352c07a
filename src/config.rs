// src/config.rs
//
// Central configuration for the promolift experiment simulator.
// This is the single source of truth for population, economics, promo
// rules, MOV behaviour and the inference layer (bootstrap / CUPED).
//
// The `Default` impl reproduces the documented reference run
// (n=100k, seed=42), which the end-to-end tests pin down.

use serde::Serialize;

/// CUPED theta policy: how the regression coefficient is estimated.
///
/// Whichever policy is configured is applied consistently to both arms
/// of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ThetaPolicy {
    /// One theta fitted on both arms' concatenated (NIR, covariate) pairs.
    /// Default: pooled theta keeps the two arms' adjustments on the same
    /// scale and uses the most data.
    #[default]
    Pooled,
    /// Theta fitted separately per arm.
    PerArm,
}

impl ThetaPolicy {
    /// Stable lowercase name (used in logs / JSON output).
    pub fn as_str(&self) -> &'static str {
        match self {
            ThetaPolicy::Pooled => "pooled",
            ThetaPolicy::PerArm => "per-arm",
        }
    }

    /// Parse a policy name (case-insensitive). Returns None if unrecognized.
    pub fn parse(s: &str) -> Option<ThetaPolicy> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pooled" | "pool" | "p" => Some(ThetaPolicy::Pooled),
            "per-arm" | "perarm" | "arm" => Some(ThetaPolicy::PerArm),
            _ => None,
        }
    }
}

/// Immutable parameter bundle for one experiment run.
///
/// Shared read-only across all stages; no stage mutates it. Two runs with
/// identical `Config` (including `seed`) produce bit-identical results.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Number of exposures (users) to simulate.
    pub n_users: usize,
    /// Seed for the simulation stream. The bootstrap stream is derived
    /// from this seed via a fixed offset (see `bootstrap_seed`).
    pub seed: u64,

    // ----- Population -----
    /// Baseline conversion probability per exposure, in [0, 1].
    pub base_conversion: f64,
    /// Beta(alpha, beta) shape parameters for per-user price sensitivity.
    pub sensitivity_alpha: f64,
    pub sensitivity_beta: f64,
    /// Log-normal parameters for baseline AOV: `ln(median)` and log-sigma.
    pub aov_log_mean: f64,
    pub aov_log_sigma: f64,

    // ----- Marketplace economics -----
    /// Commission taken on every order subtotal, in [0, 1].
    pub take_rate: f64,
    /// Delivery fee charged to the customer (waived under Free Delivery).
    pub delivery_fee: f64,
    /// Fraction of the charged fee retained after paying the courier,
    /// in [0, 1]. Courier cost = `delivery_fee * (1 - fee_margin_frac)`.
    pub fee_margin_frac: f64,

    // ----- Minimum order value -----
    /// MOV threshold in dollars. Zero disables both friction and flooring.
    pub mov_value: f64,
    /// Friction strength in [0, 1]: conversion probability of users whose
    /// expected basket falls short of MOV is scaled down proportionally
    /// to the shortfall.
    pub mov_friction: f64,

    // ----- Promo rules -----
    /// Conversion uplift in percentage points, per variant.
    pub uplift_free_delivery_pp: f64,
    pub uplift_five_off_pp: f64,
    /// Basket-size multiplier, per variant.
    pub aov_mult_free_delivery: f64,
    pub aov_mult_five_off: f64,
    /// Fixed discount for the $5-Off arm and the minimum pre-discount
    /// subtotal required to receive it. Threshold <= 0 means every
    /// converting $5-Off order gets the discount.
    pub five_off_value: f64,
    pub five_off_threshold: f64,

    // ----- Inference -----
    /// Whether the CLI / report runs the CUPED adjustment.
    pub cuped_enabled: bool,
    /// Gaussian noise sigma added to the pre-period covariate so it is
    /// correlated with, but not a deterministic function of, latent value.
    pub cuped_noise_scale: f64,
    /// Pooled vs per-arm theta estimation.
    pub theta_policy: ThetaPolicy,
    /// Bootstrap replicate count for confidence intervals.
    pub bootstrap_replicates: usize,
}

/// XOR'd into `seed` to derive the bootstrap stream, so resampling never
/// shares randomness with the simulation stream.
const BOOTSTRAP_STREAM: u64 = 0x626f_6f74_7374_7261; // "bootstra"

impl Config {
    /// Courier cost per delivered order. Incurred in full on every
    /// converted order, independent of variant.
    pub fn courier_cost(&self) -> f64 {
        self.delivery_fee * (1.0 - self.fee_margin_frac)
    }

    /// Seed for the bootstrap stream of arm `arm_index` (0 = A, 1 = B).
    /// Derived from the run seed with a fixed offset per arm so the two
    /// arms' resamples are independent but reproducible.
    pub fn bootstrap_seed(&self, arm_index: u64) -> u64 {
        (self.seed ^ BOOTSTRAP_STREAM).wrapping_add(arm_index)
    }

    /// Validate the configuration. Fails fast with the offending field
    /// before any simulation begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn prob(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be a probability in [0, 1], got {v}"),
                });
            }
            Ok(())
        }
        fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be >= 0, got {v}"),
                });
            }
            Ok(())
        }
        fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be > 0, got {v}"),
                });
            }
            Ok(())
        }

        if self.n_users == 0 {
            return Err(ConfigError::Invalid {
                field: "n_users",
                message: "must be >= 1".to_string(),
            });
        }
        if self.bootstrap_replicates == 0 {
            return Err(ConfigError::Invalid {
                field: "bootstrap_replicates",
                message: "must be >= 1".to_string(),
            });
        }

        prob("base_conversion", self.base_conversion)?;
        prob("take_rate", self.take_rate)?;
        prob("fee_margin_frac", self.fee_margin_frac)?;
        prob("mov_friction", self.mov_friction)?;

        positive("sensitivity_alpha", self.sensitivity_alpha)?;
        positive("sensitivity_beta", self.sensitivity_beta)?;
        positive("aov_log_sigma", self.aov_log_sigma)?;
        positive("aov_mult_free_delivery", self.aov_mult_free_delivery)?;
        positive("aov_mult_five_off", self.aov_mult_five_off)?;
        if !self.aov_log_mean.is_finite() {
            return Err(ConfigError::Invalid {
                field: "aov_log_mean",
                message: "must be finite".to_string(),
            });
        }

        non_negative("delivery_fee", self.delivery_fee)?;
        non_negative("mov_value", self.mov_value)?;
        non_negative("five_off_value", self.five_off_value)?;
        non_negative("five_off_threshold", self.five_off_threshold)?;
        non_negative("cuped_noise_scale", self.cuped_noise_scale)?;

        for (field, v) in [
            ("uplift_free_delivery_pp", self.uplift_free_delivery_pp),
            ("uplift_five_off_pp", self.uplift_five_off_pp),
        ] {
            if !v.is_finite() || v.abs() > 1.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("uplift must be in [-1, 1] percentage points, got {v}"),
                });
            }
        }

        Ok(())
    }
}

impl Default for Config {
    /// Reference-run parameters. The end-to-end tests pin this
    /// configuration's qualitative outcome (both arms negative NIR/1k,
    /// $5-Off less negative, Welch p < 0.05 at n=100k, seed=42).
    fn default() -> Self {
        Self {
            n_users: 100_000,
            seed: 42,

            base_conversion: 0.10,
            sensitivity_alpha: 2.0,
            sensitivity_beta: 5.0,
            // ln(18): median basket ~$18, right-skewed.
            aov_log_mean: 2.8903717578961645,
            aov_log_sigma: 0.45,

            take_rate: 0.12,
            delivery_fee: 3.99,
            fee_margin_frac: 0.25,

            mov_value: 12.0,
            mov_friction: 0.15,

            uplift_free_delivery_pp: 0.025,
            uplift_five_off_pp: 0.030,
            aov_mult_free_delivery: 1.00,
            aov_mult_five_off: 1.05,
            five_off_value: 5.00,
            five_off_threshold: 15.00,

            cuped_enabled: true,
            cuped_noise_scale: 0.5,
            theta_policy: ThetaPolicy::Pooled,
            bootstrap_replicates: 2_000,
        }
    }
}

/// Configuration errors. Raised before any simulation begins; never
/// retried internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { field: &'static str, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { field, message } => {
                write!(f, "invalid config field '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let mut cfg = Config::default();
        cfg.base_conversion = 1.2;
        let err = cfg.validate().unwrap_err();
        let ConfigError::Invalid { field, .. } = err;
        assert_eq!(field, "base_conversion");
    }

    #[test]
    fn rejects_negative_monetary_fields() {
        let mut cfg = Config::default();
        cfg.mov_value = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.five_off_value = -5.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.delivery_fee = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_population_and_zero_bootstrap() {
        let mut cfg = Config::default();
        cfg.n_users = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.bootstrap_replicates = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bootstrap_seed_is_distinct_per_arm_and_from_sim_seed() {
        let cfg = Config::default();
        assert_ne!(cfg.bootstrap_seed(0), cfg.seed);
        assert_ne!(cfg.bootstrap_seed(0), cfg.bootstrap_seed(1));
    }

    #[test]
    fn theta_policy_parse_roundtrip() {
        assert_eq!(ThetaPolicy::parse("pooled"), Some(ThetaPolicy::Pooled));
        assert_eq!(ThetaPolicy::parse("Per-Arm"), Some(ThetaPolicy::PerArm));
        assert_eq!(ThetaPolicy::parse("bogus"), None);
    }
}
