// src/outcome.rs
//
// Outcome simulator: converts one exposure into a paired
// (variant, no-promo baseline) economic outcome under the MOV
// friction/flooring rule, and the `simulate()` entrypoint that runs the
// whole pipeline.
//
// The paired counterfactual is computed inside one user-level function
// from the same underlying draws (one shared uniform for conversion, the
// shared latent AOV for the basket). Two independent simulations would
// inflate NIR variance and break the paired design.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{Config, ConfigError};
use crate::population::{assign_variants, generate_population, UserLatents};
use crate::types::{ArmResult, SimulationResult, UserRecord, Variant};

/// MOV friction factor in [0, 1] for a given expected basket.
///
/// 1.0 when MOV is disabled (`mov_value <= 0`) or the expected basket
/// clears the minimum; otherwise shrinks linearly in the relative
/// shortfall, scaled by `mov_friction`. Monotonic: a larger shortfall or
/// a larger friction strength never increases the factor, and the factor
/// never drives a probability below zero.
pub fn mov_friction_factor(cfg: &Config, expected_basket: f64) -> f64 {
    if cfg.mov_value <= 0.0 || expected_basket >= cfg.mov_value {
        return 1.0;
    }
    let shortfall = (cfg.mov_value - expected_basket) / cfg.mov_value;
    (1.0 - cfg.mov_friction * shortfall).clamp(0.0, 1.0)
}

/// Conversion probability for one user under a given uplift and basket
/// multiplier: base conversion plus sensitivity-scaled uplift, clamped to
/// [0, 1], then discounted by MOV friction on the expected basket.
pub fn conversion_probability(
    cfg: &Config,
    sensitivity: f64,
    baseline_aov: f64,
    uplift_pp: f64,
    aov_mult: f64,
) -> f64 {
    let p = (cfg.base_conversion + uplift_pp * sensitivity).clamp(0.0, 1.0);
    p * mov_friction_factor(cfg, baseline_aov * aov_mult)
}

/// Floor a settled basket up to the MOV: baskets never settle below the
/// minimum once an order is placed.
fn floor_to_mov(cfg: &Config, subtotal: f64) -> f64 {
    subtotal.max(cfg.mov_value)
}

/// Net revenue of one converted order.
fn order_net(cfg: &Config, subtotal: f64, fee_charged: f64, discount: f64) -> f64 {
    cfg.take_rate * subtotal + fee_charged - cfg.courier_cost() - discount
}

/// Simulate one exposure: conversion, basket, fees, discount, and the
/// paired no-promo counterfactual, from a single uniform draw.
pub fn simulate_user(
    cfg: &Config,
    id: usize,
    latents: &UserLatents,
    variant: Variant,
    rng: &mut ChaCha8Rng,
) -> UserRecord {
    let uplift = variant.uplift_pp(cfg);
    let mult = variant.aov_multiplier(cfg);

    let p_variant = conversion_probability(cfg, latents.sensitivity, latents.baseline_aov, uplift, mult);
    let p_baseline = conversion_probability(cfg, latents.sensitivity, latents.baseline_aov, 0.0, 1.0);

    // One shared draw decides both conversions (paired design).
    let u: f64 = rng.gen();
    let converted = u < p_variant;
    let baseline_converted = u < p_baseline;

    // Variant outcome.
    let (subtotal, fee_charged, courier, discount, net) = if converted {
        let subtotal = floor_to_mov(cfg, latents.baseline_aov * mult);
        let fee_charged = match variant {
            // Fee revenue foregone; courier is still paid in full.
            Variant::FreeDelivery => 0.0,
            Variant::FiveOff => cfg.delivery_fee,
        };
        let discount = match variant {
            Variant::FreeDelivery => 0.0,
            // Gated on the pre-discount (post-flooring) subtotal.
            Variant::FiveOff => {
                if subtotal >= cfg.five_off_threshold {
                    cfg.five_off_value
                } else {
                    0.0
                }
            }
        };
        let net = order_net(cfg, subtotal, fee_charged, discount);
        (subtotal, fee_charged, cfg.courier_cost(), discount, net)
    } else {
        (0.0, 0.0, 0.0, 0.0, 0.0)
    };

    // Paired no-promo baseline: full fee, no uplift, no multiplier,
    // no discount, same underlying draws.
    let baseline_net = if baseline_converted {
        let baseline_subtotal = floor_to_mov(cfg, latents.baseline_aov);
        order_net(cfg, baseline_subtotal, cfg.delivery_fee, 0.0)
    } else {
        0.0
    };

    UserRecord {
        id,
        variant,
        sensitivity: latents.sensitivity,
        baseline_aov: latents.baseline_aov,
        pre_period_net: latents.pre_period_net,
        converted,
        subtotal,
        delivery_fee_charged: fee_charged,
        courier_cost: courier,
        promo_discount: discount,
        net_revenue: net,
        baseline_net_revenue: baseline_net,
        nir: net - baseline_net,
    }
}

/// Run the full pipeline: validate config, generate the population,
/// assign variants, simulate every exposure, and group the records by
/// arm. Pure function of (Config, seed); identical inputs produce
/// bit-identical results.
pub fn simulate(cfg: &Config) -> Result<SimulationResult, ConfigError> {
    cfg.validate()?;

    // Single simulation stream, threaded through the stages in a fixed
    // order: population latents, then assignment coins, then one
    // conversion draw per exposure. Never reseeded mid-run.
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);

    let latents = generate_population(cfg, &mut rng)?;
    let variants = assign_variants(cfg.n_users, &mut rng);

    let mut arm_a = ArmResult::new(Variant::FreeDelivery);
    let mut arm_b = ArmResult::new(Variant::FiveOff);
    let mut users = Vec::with_capacity(cfg.n_users);

    for (id, (lat, variant)) in latents.iter().zip(variants.iter()).enumerate() {
        let record = simulate_user(cfg, id, lat, *variant, &mut rng);

        let arm = match variant {
            Variant::FreeDelivery => &mut arm_a,
            Variant::FiveOff => &mut arm_b,
        };
        arm.nir.push(record.nir);
        arm.covariate.push(record.pre_period_net);

        users.push(record);
    }

    Ok(SimulationResult { arm_a, arm_b, users })
}

/// Mean NIR per 1,000 exposures for a raw NIR vector. NaN on empty input.
pub fn nir_per_1k(nir: &[f64]) -> f64 {
    if nir.is_empty() {
        return f64::NAN;
    }
    nir.iter().sum::<f64>() / (nir.len() as f64) * 1_000.0
}
