// src/main.rs
//
// CLI entrypoint: run one experiment, print the report, optionally
// export the JSON summary and the per-exposure CSV table.
//
// Run examples:
//   cargo run --release -- --users 100000 --seed 42
//   cargo run --release -- --bootstrap 5000 --theta-policy per-arm \
//       --output-dir runs/exp1 --csv

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use promolift::config::{Config, ThetaPolicy};
use promolift::cuped::cuped_adjust_experiment;
use promolift::outcome::simulate;
use promolift::output::{write_summary_json, write_users_csv, ExperimentSummary};
use promolift::report::{render, ReportInputs};
use promolift::stats::summarize;
use promolift::welch::compare_arms;

#[derive(Debug, Parser)]
#[command(
    name = "promolift",
    about = "Two-arm promo experiment simulator (Free Delivery vs. $5-Off) with NIR/1k inference",
    version
)]
struct Args {
    /// Number of exposures to simulate.
    #[arg(long, default_value_t = 100_000)]
    users: usize,

    /// Deterministic seed for the run.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Bootstrap replicate count for confidence intervals.
    #[arg(long, default_value_t = 2_000)]
    bootstrap: usize,

    /// CUPED theta policy: pooled | per-arm.
    #[arg(long, default_value = "pooled")]
    theta_policy: String,

    /// Disable the CUPED adjustment.
    #[arg(long)]
    no_cuped: bool,

    /// Output directory for exports (created if missing).
    #[arg(long, default_value = "runs/latest")]
    output_dir: PathBuf,

    /// Write experiment_summary.json to the output directory.
    #[arg(long)]
    json: bool,

    /// Write the combined per-exposure table as users.csv.
    #[arg(long)]
    csv: bool,

    /// Suppress the text report (exports still run).
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let theta_policy = match ThetaPolicy::parse(&args.theta_policy) {
        Some(p) => p,
        None => bail!("invalid --theta-policy (expected: pooled | per-arm)"),
    };

    let cfg = Config {
        n_users: args.users,
        seed: args.seed,
        bootstrap_replicates: args.bootstrap,
        cuped_enabled: !args.no_cuped,
        theta_policy,
        ..Config::default()
    };

    let result = simulate(&cfg).context("simulation failed")?;

    let raw_a = summarize(
        &result.arm_a.nir,
        cfg.bootstrap_replicates,
        cfg.bootstrap_seed(0),
    );
    let raw_b = summarize(
        &result.arm_b.nir,
        cfg.bootstrap_replicates,
        cfg.bootstrap_seed(1),
    );
    let welch = compare_arms(&result.arm_a.nir, &result.arm_b.nir);
    let cuped = cfg
        .cuped_enabled
        .then(|| cuped_adjust_experiment(&result, &cfg));

    if !args.quiet {
        print!(
            "{}",
            render(&ReportInputs {
                cfg: &cfg,
                raw_a,
                raw_b,
                welch,
                cuped,
            })
        );
    }

    if args.json || args.csv {
        fs::create_dir_all(&args.output_dir).with_context(|| {
            format!("failed to create output directory {:?}", args.output_dir)
        })?;
    }
    if args.json {
        let summary = ExperimentSummary::new(&cfg, &result, raw_a, raw_b, welch, cuped);
        let path = args.output_dir.join("experiment_summary.json");
        write_summary_json(&path, &summary)
            .with_context(|| format!("failed to write {path:?}"))?;
        if !args.quiet {
            eprintln!("wrote {}", path.display());
        }
    }
    if args.csv {
        let path = args.output_dir.join("users.csv");
        write_users_csv(&path, &result).with_context(|| format!("failed to write {path:?}"))?;
        if !args.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}
