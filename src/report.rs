// src/report.rs
//
// Human-readable text report for one experiment run. Thin printer over
// the core results; owns no statistics of its own.

use crate::config::Config;
use crate::cuped::CupedResult;
use crate::stats::SummaryStatistics;
use crate::types::Variant;
use crate::welch::WelchResult;

/// Everything the report needs, grouped so callers (CLI, tests) can
/// render without re-deriving anything.
#[derive(Debug, Clone)]
pub struct ReportInputs<'a> {
    pub cfg: &'a Config,
    pub raw_a: SummaryStatistics,
    pub raw_b: SummaryStatistics,
    pub welch: WelchResult,
    /// Present when CUPED is enabled in the config.
    pub cuped: Option<(CupedResult, CupedResult)>,
}

fn arm_line(label: &str, s: &SummaryStatistics) -> String {
    format!(
        "  {:<14} n={:<7} NIR/1k={:>10.3}  95% CI [{:>10.3}, {:>10.3}]",
        label, s.n, s.nir_per_1k, s.ci_lower, s.ci_upper
    )
}

/// Render the report as a single string (the CLI prints it; tests can
/// assert on it).
pub fn render(inputs: &ReportInputs<'_>) -> String {
    let cfg = inputs.cfg;
    let mut out = String::new();

    out.push_str(&format!(
        "promolift v{} | users={} seed={} bootstrap={} theta_policy={}\n",
        env!("CARGO_PKG_VERSION"),
        cfg.n_users,
        cfg.seed,
        cfg.bootstrap_replicates,
        cfg.theta_policy.as_str()
    ));
    out.push_str(&format!(
        "economics: take_rate={:.3} fee={:.2} courier={:.2} mov={:.2} friction={:.2}\n",
        cfg.take_rate,
        cfg.delivery_fee,
        cfg.courier_cost(),
        cfg.mov_value,
        cfg.mov_friction
    ));

    out.push_str("\nraw NIR per 1,000 exposures:\n");
    out.push_str(&arm_line(Variant::FreeDelivery.as_str(), &inputs.raw_a));
    out.push('\n');
    out.push_str(&arm_line(Variant::FiveOff.as_str(), &inputs.raw_b));
    out.push('\n');

    let w = &inputs.welch;
    out.push_str(&format!(
        "\nWelch t-test (five_off - free_delivery): t={:.4} df={:.1} p={:.6}\n",
        w.t_statistic, w.df, w.p_value
    ));

    if let Some((ca, cb)) = &inputs.cuped {
        out.push_str(&format!(
            "\nCUPED ({}) theta_a={:.5} theta_b={:.5}\n",
            ca.policy.as_str(),
            ca.theta,
            cb.theta
        ));
        out.push_str(&arm_line(Variant::FreeDelivery.as_str(), &ca.adjusted));
        out.push('\n');
        out.push_str(&arm_line(Variant::FiveOff.as_str(), &cb.adjusted));
        out.push('\n');
    }

    out
}
