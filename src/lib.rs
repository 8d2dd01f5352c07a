//! Promolift core library.
//!
//! Deterministic two-arm promo experiment simulator (Free Delivery vs.
//! $5-Off) for a delivery marketplace, with the inference layer that
//! turns simulated outcomes into decisions. The binary (`src/main.rs`)
//! is just a thin report / export harness around these components.
//!
//! # Pipeline
//!
//! Data flows strictly downward:
//!
//! - **Config** (`config`): immutable, validated parameter bundle.
//! - **Population** (`population`): per-user latents (Beta sensitivity,
//!   log-normal AOV, noisy pre-period covariate) + fair-coin variant
//!   assignment, all on one seeded stream in fixed call order.
//! - **Outcome** (`outcome`): per-user conversion / basket / fee /
//!   discount economics under MOV friction and flooring, with a paired
//!   no-promo counterfactual computed from the same draws. NIR =
//!   variant net minus baseline net.
//! - **Inference** (`stats`, `welch`, `cuped`): bootstrap CIs around
//!   NIR/1k, Welch's two-sample t-test, CUPED covariate adjustment.
//! - **Edges** (`report`, `output`): text report and JSON/CSV export.
//!
//! Everything is a pure function of (Config, seed): two runs with an
//! identical config produce bit-identical records and statistics.

pub mod config;
pub mod cuped;
pub mod outcome;
pub mod output;
pub mod population;
pub mod report;
pub mod stats;
pub mod types;
pub mod welch;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{Config, ConfigError, ThetaPolicy};

pub use types::{ArmResult, SimulationResult, UserRecord, Variant};

pub use outcome::{conversion_probability, mov_friction_factor, nir_per_1k, simulate};

pub use stats::{percentile, summarize, OnlineStats, SummaryStatistics};

pub use welch::{compare_arms, WelchResult};

pub use cuped::{adjust_vector, cuped_adjust, cuped_adjust_experiment, cuped_theta, CupedResult};

pub use report::{render, ReportInputs};

pub use output::{write_summary_json, write_users_csv, ExperimentSummary};
