// src/output.rs
//
// Persistence boundary: versioned JSON summary + CSV export of the
// combined per-exposure table. The core hands over plain structures; no
// other module knows about file formats.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::cuped::CupedResult;
use crate::stats::SummaryStatistics;
use crate::types::SimulationResult;
use crate::welch::WelchResult;

/// Bump on breaking changes to experiment_summary.json.
pub const SCHEMA_VERSION: u32 = 1;

/// Per-arm block of the JSON summary.
#[derive(Debug, Clone, Serialize)]
pub struct ArmSummary {
    pub variant: &'static str,
    pub n: usize,
    pub raw: SummaryStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuped: Option<CupedResult>,
}

/// Versioned JSON summary of one experiment run.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary<'a> {
    pub schema_version: u32,
    pub promolift_version: &'static str,
    pub config: &'a Config,
    pub arm_a: ArmSummary,
    pub arm_b: ArmSummary,
    pub welch: WelchResult,
}

impl<'a> ExperimentSummary<'a> {
    pub fn new(
        cfg: &'a Config,
        result: &SimulationResult,
        raw_a: SummaryStatistics,
        raw_b: SummaryStatistics,
        welch: WelchResult,
        cuped: Option<(CupedResult, CupedResult)>,
    ) -> Self {
        let (cuped_a, cuped_b) = match cuped {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };
        Self {
            schema_version: SCHEMA_VERSION,
            promolift_version: env!("CARGO_PKG_VERSION"),
            config: cfg,
            arm_a: ArmSummary {
                variant: result.arm_a.variant.as_str(),
                n: result.arm_a.n(),
                raw: raw_a,
                cuped: cuped_a,
            },
            arm_b: ArmSummary {
                variant: result.arm_b.variant.as_str(),
                n: result.arm_b.n(),
                raw: raw_b,
                cuped: cuped_b,
            },
            welch,
        }
    }
}

/// Write a file atomically (temp file + rename).
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let temp_name = format!(
        ".tmp_{}_{}",
        std::process::id(),
        path.file_name()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
    );
    let temp_path = parent.join(&temp_name);

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Serialize the summary to pretty JSON and write it atomically.
pub fn write_summary_json(path: &Path, summary: &ExperimentSummary<'_>) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    atomic_write(path, &json)?;
    Ok(())
}

/// Fixed CSV header for the combined per-exposure table.
pub const CSV_HEADER: &str = "id,variant,sensitivity,baseline_aov,pre_period_net,converted,\
subtotal,delivery_fee_charged,courier_cost,promo_discount,net_revenue,baseline_net_revenue,nir";

/// Export the combined per-exposure table as CSV.
pub fn write_users_csv(path: &Path, result: &SimulationResult) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    writeln!(w, "{CSV_HEADER}")?;
    for u in &result.users {
        writeln!(
            w,
            "{},{},{:.6},{:.6},{:.6},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            u.id,
            u.variant.as_str(),
            u.sensitivity,
            u.baseline_aov,
            u.pre_period_net,
            u.converted,
            u.subtotal,
            u.delivery_fee_charged,
            u.courier_cost,
            u.promo_discount,
            u.net_revenue,
            u.baseline_net_revenue,
            u.nir
        )?;
    }
    w.flush()?;
    Ok(())
}
