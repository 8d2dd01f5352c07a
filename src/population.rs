// src/population.rs
//
// Population generator + variant assignor.
//
// Both stages consume the single simulation stream in a fixed, documented
// order so identical seeds reproduce identical populations bit-for-bit:
//   1) per user: sensitivity (Beta), baseline AOV (log-normal),
//      covariate noise (Normal) -- three draws, in that order;
//   2) per user: one fair-coin variant draw.
// Do not reorder or interleave these passes.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution, LogNormal, Normal};

use crate::config::{Config, ConfigError};
use crate::types::Variant;

/// Variant-independent latent attributes for one exposure.
#[derive(Debug, Clone, Copy)]
pub struct UserLatents {
    /// Price sensitivity in [0, 1].
    pub sensitivity: f64,
    /// Baseline average order value, always > 0.
    pub baseline_aov: f64,
    /// Pre-period baseline net revenue per exposure (CUPED covariate).
    pub pre_period_net: f64,
}

/// Draw latent attributes for `cfg.n_users` exposures, independent of
/// variant.
///
/// The pre-period covariate is the user's expected no-promo net revenue
/// per exposure (conversion-weighted commission plus fee margin) with
/// Gaussian noise of sigma `cuped_noise_scale` added, so it correlates
/// with latent value without being a deterministic function of it.
pub fn generate_population(
    cfg: &Config,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<UserLatents>, ConfigError> {
    let sensitivity_dist = Beta::new(cfg.sensitivity_alpha, cfg.sensitivity_beta)
        .map_err(|e| distribution_error("sensitivity_alpha/sensitivity_beta", e))?;
    let aov_dist = LogNormal::new(cfg.aov_log_mean, cfg.aov_log_sigma)
        .map_err(|e| distribution_error("aov_log_mean/aov_log_sigma", e))?;
    let noise_dist = Normal::new(0.0, cfg.cuped_noise_scale)
        .map_err(|e| distribution_error("cuped_noise_scale", e))?;

    let fee_margin = cfg.delivery_fee - cfg.courier_cost();

    let mut users = Vec::with_capacity(cfg.n_users);
    for _ in 0..cfg.n_users {
        let sensitivity: f64 = sensitivity_dist.sample(rng);
        let baseline_aov: f64 = aov_dist.sample(rng);
        let noise: f64 = noise_dist.sample(rng);

        let expected_net = cfg.base_conversion * (cfg.take_rate * baseline_aov + fee_margin);
        users.push(UserLatents {
            sensitivity,
            baseline_aov,
            pre_period_net: expected_net + noise,
        });
    }
    Ok(users)
}

/// Assign one variant per exposure via independent fair coin flips.
///
/// Arm sizes are the realized Binomial(N, 1/2) counts; downstream
/// statistics must use these realized sizes, never a forced N/2 split.
pub fn assign_variants(n_users: usize, rng: &mut ChaCha8Rng) -> Vec<Variant> {
    (0..n_users)
        .map(|_| {
            if rng.gen_bool(0.5) {
                Variant::FreeDelivery
            } else {
                Variant::FiveOff
            }
        })
        .collect()
}

fn distribution_error<E: std::fmt::Display>(field: &'static str, e: E) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: format!("rejected by distribution constructor: {e}"),
    }
}
