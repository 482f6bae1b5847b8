//! End-to-end recovery properties of the forward/sample/inverse pipeline.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use ez_recovery::config::{EstimateBounds, ExperimentConfig};
use ez_recovery::evaluator::TrialOutcome;
use ez_recovery::report::save_report;
use ez_recovery::{
    evaluate_trial, forward, inverse, run_experiment, run_experiment_parallel, run_with_config,
    Parameters, RecoveryError,
};

const GRID: [f64; 4] = [0.5, 1.0, 1.5, 2.0];
const T_GRID: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

// ── Noiseless round trip ─────────────────────────────────────────────

#[test]
fn noiseless_round_trip_over_grid() {
    for &v in &GRID {
        for &a in &GRID {
            for &t in &T_GRID {
                let est = inverse(&forward(&Parameters::new(v, a, t))).params;
                assert!((est.v - v).abs() < 1e-5, "v: {v} -> {}", est.v);
                assert!((est.a - a).abs() < 1e-5, "a: {a} -> {}", est.a);
                assert!((est.t - t).abs() < 1e-5, "t: {t} -> {}", est.t);
            }
        }
    }
}

// ── Forward limits and monotonicity ──────────────────────────────────

#[test]
fn zero_drift_limit() {
    for eps in [1e-3, 1e-4, 1e-6, 1e-10] {
        let p = forward(&Parameters::new(eps, 1.0, 0.3));
        assert!((p.r - 0.5).abs() < 0.01, "eps={eps}: R={}", p.r);
        assert!(p.in_domain(), "eps={eps}: {p:?}");
    }
}

#[test]
fn high_drift_limit() {
    let p = forward(&Parameters::new(10.0, 1.0, 0.3));
    assert!(p.r > 0.99, "R={}", p.r);
}

#[test]
fn mean_rt_increases_with_boundary() {
    for &v in &GRID {
        let mut prev = forward(&Parameters::new(v, 0.25, 0.3)).m;
        for i in 1..40 {
            let a = 0.25 + 0.1 * i as f64;
            let m = forward(&Parameters::new(v, a, 0.3)).m;
            assert!(m > prev, "v={v}, a={a}: {m} <= {prev}");
            prev = m;
        }
    }
}

#[test]
fn nondecision_shift_moves_mean_rt_exactly() {
    for &v in &GRID {
        for &a in &GRID {
            let base = forward(&Parameters::new(v, a, 0.2));
            for delta in [0.05, 0.1, 0.25] {
                let shifted = forward(&Parameters::new(v, a, 0.2 + delta));
                assert!((shifted.m - base.m - delta).abs() < 1e-12);
                assert_eq!(shifted.r, base.r);
                assert_eq!(shifted.var, base.var);
            }
        }
    }
}

// ── Stress finiteness ────────────────────────────────────────────────

#[test]
fn finite_under_stress() {
    let grid = [
        (0.001, 1.0, 0.3),
        (10.0, 1.0, 0.3),
        (1.0, 0.01, 0.3),
        (1.0, 10.0, 0.3),
        (1.0, 1.0, 0.01),
        (1.0, 1.0, 0.9),
    ];
    for (v, a, t) in grid {
        let p = forward(&Parameters::new(v, a, t));
        assert!(p.is_finite(), "({v}, {a}, {t}) -> {p:?}");
        if p.in_domain() {
            let est = inverse(&p);
            assert!(est.params.is_finite(), "({v}, {a}, {t}) -> {:?}", est.params);
        }
    }
}

// ── Sampling noise ───────────────────────────────────────────────────

fn mean_squared_error_at(n: usize, trials: usize, seed: u64) -> f64 {
    let truth = Parameters::new(1.0, 1.0, 0.3);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut sum = 0.0;
    let mut count = 0usize;
    for _ in 0..trials {
        if let TrialOutcome::Recovered(r) = evaluate_trial(&truth, n, &mut rng).unwrap() {
            sum += r.squared_error;
            count += 1;
        }
    }
    assert!(count > trials * 9 / 10, "too many degenerate trials at N={n}");
    sum / count as f64
}

#[test]
fn error_shrinks_with_sample_size() {
    let mse_10 = mean_squared_error_at(10, 2000, 42);
    let mse_40 = mean_squared_error_at(40, 2000, 42);
    let mse_4000 = mean_squared_error_at(4000, 2000, 42);
    assert!(mse_4000 < mse_40, "N=4000 {mse_4000} vs N=40 {mse_40}");
    assert!(mse_40 < mse_10, "N=40 {mse_40} vs N=10 {mse_10}");
}

#[test]
fn end_to_end_seed_42() {
    let mut rng = SmallRng::seed_from_u64(42);
    let truth = Parameters::new(1.0, 1.0, 0.3);
    let outcome = evaluate_trial(&truth, 1000, &mut rng).unwrap();
    let r = outcome.recovered().expect("trial at N=1000 should recover");

    assert!((r.estimated.v - 1.0).abs() < 0.5, "v={}", r.estimated.v);
    assert!((r.estimated.a - 1.0).abs() < 0.5, "a={}", r.estimated.a);
    assert!((r.estimated.t - 0.3).abs() < 0.2, "t={}", r.estimated.t);

    let manual = (truth.v - r.estimated.v).powi(2)
        + (truth.a - r.estimated.a).powi(2)
        + (truth.t - r.estimated.t).powi(2);
    assert!((r.squared_error - manual).abs() < 1e-10);
    assert_eq!(r.bias.v, truth.v - r.estimated.v);
    assert_eq!(r.bias.a, truth.a - r.estimated.a);
    assert_eq!(r.bias.t, truth.t - r.estimated.t);
}

// ── Driver ───────────────────────────────────────────────────────────

#[test]
fn sequential_run_is_reproducible() {
    let a = run_experiment(&[10, 40, 4000], 200, 42).unwrap();
    let b = run_experiment(&[10, 40, 4000], 200, 42).unwrap();
    assert_eq!(a, b);
}

#[test]
fn parallel_run_is_reproducible() {
    let a = run_experiment_parallel(&[10, 40], 300, 42).unwrap();
    let b = run_experiment_parallel(&[10, 40], 300, 42).unwrap();
    assert_eq!(a, b);
    assert!(a.parallel);
}

#[test]
fn default_sweep_orders_error_by_sample_size() {
    let report = run_experiment(&[10, 40, 4000], 1000, 42).unwrap();
    let agg = report.aggregates();
    let mse = |n: usize| agg[&n].mean_squared_error;
    assert!(mse(4000) < mse(40));
    assert!(mse(40) < mse(10));
    for stats in agg.values() {
        assert!(stats.mean_bias.v.is_finite());
        assert!(stats.mean_bias.a.is_finite());
        assert!(stats.mean_bias.t.is_finite());
        assert_eq!(stats.trials, 1000);
    }
}

#[test]
fn audit_table_is_consistent() {
    let report = run_experiment(&[40], 100, 5).unwrap();
    let size = report.get(40).unwrap();
    for row in &size.trials {
        let bias = row.bias;
        assert!((bias.v - (row.truth.v - row.estimated.v)).abs() < 1e-15);
        assert!((bias.a - (row.truth.a - row.estimated.a)).abs() < 1e-15);
        assert!((bias.t - (row.truth.t - row.estimated.t)).abs() < 1e-15);
        assert!((row.squared_error - bias.squared_norm()).abs() < 1e-12);
        assert!(row.truth.v >= 0.5 && row.truth.v < 2.0);
        assert!(row.truth.a >= 0.5 && row.truth.a < 2.0);
        assert!(row.truth.t >= 0.1 && row.truth.t < 0.5);
    }
}

#[test]
fn sample_size_below_two_is_rejected() {
    let err = run_experiment(&[10, 1], 10, 42).unwrap_err();
    assert!(matches!(err, RecoveryError::InvalidSampleSize { n: 1 }));
    let err = run_experiment_parallel(&[0], 10, 42).unwrap_err();
    assert!(err.is_domain_violation());
}

#[test]
fn clipping_bounds_every_estimate() {
    let config = ExperimentConfig {
        sample_sizes: vec![10],
        iterations_per_size: 500,
        estimate_bounds: Some(EstimateBounds::default()),
        ..Default::default()
    };
    let report = run_with_config(&config).unwrap();
    assert!(report.estimate_clipping);
    let size = &report.results[0];
    for row in size.trials.iter().filter(|r| r.degenerate.is_none()) {
        assert!(row.estimated.v >= 0.1 && row.estimated.v <= 5.0);
        assert!(row.estimated.a >= 0.1 && row.estimated.a <= 5.0);
        assert!(row.estimated.t >= 0.01 && row.estimated.t <= 1.0);
    }
    assert!(size.stats.diagnostics.estimates_clipped > 0);
}

#[test]
fn report_files_written() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_experiment(&[10, 40], 30, 42).unwrap();
    let written = save_report(&report, dir.path()).unwrap();
    assert_eq!(written.len(), 4);
    for path in &written {
        assert!(path.exists(), "{}", path.display());
    }
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    assert_eq!(json["results"][0]["stats"]["sample_size"], 10);
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"sample_sizes": [20, 80], "iterations_per_size": 15, "seed": 7}"#,
    )
    .unwrap();
    let config = ExperimentConfig::from_json_file(&path).unwrap();
    assert_eq!(config.sample_sizes, vec![20, 80]);
    let report = run_with_config(&config).unwrap();
    assert_eq!(report.seed, 7);
    assert_eq!(report.results[1].stats.trials, 15);
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"sample_sizes": []}"#).unwrap();
    assert!(matches!(
        ExperimentConfig::from_json_file(&path),
        Err(RecoveryError::Config(_))
    ));
    assert!(matches!(
        ExperimentConfig::from_json_file(dir.path().join("missing.json")),
        Err(RecoveryError::Io { .. })
    ));
}
