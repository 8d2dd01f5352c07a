// tests/determinism_tests.rs
//
// Reproducibility contract: the whole pipeline is a pure function of
// (Config, seed). Two runs with an identical config must agree
// bit-for-bit, from UserRecords down to bootstrap CIs.

use promolift::config::Config;
use promolift::cuped::cuped_adjust_experiment;
use promolift::outcome::simulate;
use promolift::stats::summarize;
use promolift::welch::compare_arms;

fn test_cfg(seed: u64) -> Config {
    Config {
        n_users: 5_000,
        seed,
        bootstrap_replicates: 300,
        ..Config::default()
    }
}

#[test]
fn identical_configs_yield_identical_user_records() {
    let cfg = test_cfg(42);
    let a = simulate(&cfg).unwrap();
    let b = simulate(&cfg).unwrap();

    assert_eq!(a.users.len(), b.users.len());
    for (x, y) in a.users.iter().zip(b.users.iter()) {
        assert_eq!(x, y, "record {} diverged between identical runs", x.id);
    }
    assert_eq!(a.arm_a.n(), b.arm_a.n());
    assert_eq!(a.arm_b.n(), b.arm_b.n());
}

#[test]
fn identical_configs_yield_identical_statistics() {
    let cfg = test_cfg(7);
    let r1 = simulate(&cfg).unwrap();
    let r2 = simulate(&cfg).unwrap();

    let s1 = summarize(&r1.arm_a.nir, cfg.bootstrap_replicates, cfg.bootstrap_seed(0));
    let s2 = summarize(&r2.arm_a.nir, cfg.bootstrap_replicates, cfg.bootstrap_seed(0));
    assert_eq!(s1.nir_per_1k.to_bits(), s2.nir_per_1k.to_bits());
    assert_eq!(s1.ci_lower.to_bits(), s2.ci_lower.to_bits());
    assert_eq!(s1.ci_upper.to_bits(), s2.ci_upper.to_bits());

    let w1 = compare_arms(&r1.arm_a.nir, &r1.arm_b.nir);
    let w2 = compare_arms(&r2.arm_a.nir, &r2.arm_b.nir);
    assert_eq!(w1.t_statistic.to_bits(), w2.t_statistic.to_bits());
    assert_eq!(w1.p_value.to_bits(), w2.p_value.to_bits());

    let (ca1, cb1) = cuped_adjust_experiment(&r1, &cfg);
    let (ca2, cb2) = cuped_adjust_experiment(&r2, &cfg);
    assert_eq!(ca1.theta.to_bits(), ca2.theta.to_bits());
    assert_eq!(cb1.theta.to_bits(), cb2.theta.to_bits());
    assert_eq!(
        ca1.adjusted.ci_lower.to_bits(),
        ca2.adjusted.ci_lower.to_bits()
    );
    assert_eq!(
        cb1.adjusted.ci_upper.to_bits(),
        cb2.adjusted.ci_upper.to_bits()
    );
}

#[test]
fn different_seeds_yield_different_results() {
    let a = simulate(&test_cfg(1)).unwrap();
    let b = simulate(&test_cfg(2)).unwrap();

    // Arm sizes alone will almost surely differ; the full tables must.
    let same = a
        .users
        .iter()
        .zip(b.users.iter())
        .all(|(x, y)| x.baseline_aov.to_bits() == y.baseline_aov.to_bits());
    assert!(!same, "seed change did not perturb the population");
}

#[test]
fn summaries_use_realized_arm_sizes() {
    let cfg = test_cfg(3);
    let r = simulate(&cfg).unwrap();

    assert_eq!(r.arm_a.n() + r.arm_b.n(), cfg.n_users);
    let sa = summarize(&r.arm_a.nir, 100, cfg.bootstrap_seed(0));
    let sb = summarize(&r.arm_b.nir, 100, cfg.bootstrap_seed(1));
    assert_eq!(sa.n, r.arm_a.n());
    assert_eq!(sb.n, r.arm_b.n());

    // Fair coin split: sizes random, not forced to n/2.
    // |n_a - n_b| has sd = sqrt(n) ~ 71; allow 5 sigma.
    let gap = (r.arm_a.n() as i64 - r.arm_b.n() as i64).unsigned_abs();
    assert!(gap < 360, "arm size gap {gap} inconsistent with fair coin");
}
