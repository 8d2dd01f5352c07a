// src/types.rs
//
// Shared data types for the experiment pipeline: variants, per-exposure
// records, and the grouped simulation result handed back to the caller.

use serde::Serialize;

use crate::config::Config;

/// Experiment arm label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Variant {
    /// Arm A: delivery fee waived, courier cost still incurred.
    FreeDelivery,
    /// Arm B: fixed $5 discount above a subtotal threshold.
    FiveOff,
}

impl Variant {
    /// Stable label used in reports, CSV rows and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::FreeDelivery => "free_delivery",
            Variant::FiveOff => "five_off",
        }
    }

    /// Conversion uplift (percentage points) for this arm.
    pub fn uplift_pp(&self, cfg: &Config) -> f64 {
        match self {
            Variant::FreeDelivery => cfg.uplift_free_delivery_pp,
            Variant::FiveOff => cfg.uplift_five_off_pp,
        }
    }

    /// Basket-size multiplier for this arm.
    pub fn aov_multiplier(&self, cfg: &Config) -> f64 {
        match self {
            Variant::FreeDelivery => cfg.aov_mult_free_delivery,
            Variant::FiveOff => cfg.aov_mult_five_off,
        }
    }
}

/// One exposure. Latent fields are drawn by the population generator;
/// outcome fields are filled in exactly once by the outcome simulator.
///
/// Invariants:
/// - `subtotal >= mov_value` whenever `converted` (flooring applied);
/// - non-converted exposures carry zeros for every monetary field, so
///   `nir == 0.0` for them;
/// - `nir == net_revenue - baseline_net_revenue` always.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    /// Index within the run (0-based).
    pub id: usize,
    /// Assigned arm.
    pub variant: Variant,

    // ----- Latents (population generator) -----
    /// Price sensitivity in [0, 1]; scales promo responsiveness.
    pub sensitivity: f64,
    /// Baseline average order value (log-normal draw).
    pub baseline_aov: f64,
    /// Pre-period baseline net revenue per exposure; CUPED covariate.
    pub pre_period_net: f64,

    // ----- Outcomes (outcome simulator) -----
    /// Whether the exposure converted under the assigned variant.
    pub converted: bool,
    /// Settled basket value (post-flooring). 0 when not converted.
    pub subtotal: f64,
    /// Delivery fee actually charged (0 under Free Delivery).
    pub delivery_fee_charged: f64,
    /// Courier cost incurred (0 when not converted).
    pub courier_cost: f64,
    /// Promo discount applied ($5-Off only, threshold-gated).
    pub promo_discount: f64,
    /// Net revenue under the assigned variant.
    pub net_revenue: f64,
    /// Net revenue for the same user under the paired no-promo baseline.
    pub baseline_net_revenue: f64,
    /// Net incremental revenue: `net_revenue - baseline_net_revenue`.
    pub nir: f64,
}

/// Per-arm slice of a simulation: the vectors the inference layer needs,
/// at the arm's realized (random) size.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmResult {
    pub variant: Variant,
    /// Per-exposure NIR, in arm order.
    pub nir: Vec<f64>,
    /// Paired pre-period covariate, same order as `nir`.
    pub covariate: Vec<f64>,
}

impl ArmResult {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            nir: Vec::new(),
            covariate: Vec::new(),
        }
    }

    /// Realized arm size.
    pub fn n(&self) -> usize {
        self.nir.len()
    }
}

/// Full output of one `simulate()` call: both arms plus the combined
/// per-exposure table. Immutable once produced; a new seed produces a
/// new result rather than updating this one in place.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub arm_a: ArmResult,
    pub arm_b: ArmResult,
    /// Combined table in exposure order (union of both arms).
    pub users: Vec<UserRecord>,
}

impl SimulationResult {
    pub fn arm(&self, variant: Variant) -> &ArmResult {
        match variant {
            Variant::FreeDelivery => &self.arm_a,
            Variant::FiveOff => &self.arm_b,
        }
    }
}
