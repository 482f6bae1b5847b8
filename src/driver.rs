//! Experiment driver: repeat the evaluator across sample sizes and aggregate.
//!
//! Two execution modes, both bit-reproducible for a fixed seed:
//!
//! - [`run_experiment`]: one `SmallRng` seeded once from the master seed and
//!   consumed in `(N, iteration)` order. Each iteration draws (v, a, t), then
//!   the Binomial, Normal and Gamma variates of the trial.
//! - [`run_experiment_parallel`]: trials on the rayon pool, each with its own
//!   substream seeded from `(seed, N, iteration)` (see [`crate::substream`]).
//!   Results are collected in iteration order, so the report does not depend on
//!   thread count or scheduling. The two modes draw different numbers.
//!
//! Domain violations (N < 2) abort the run before any trial executes.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::constants::{MIN_SAMPLE_SIZE, PROGRESS_INTERVAL};
use crate::error::{RecoveryError, Result};
use crate::evaluator::{evaluate_trial_with, TrialOutcome, TrialSettings};
use crate::statistics::{AggregateAccumulator, ExperimentReport, SampleSizeReport, TrialRecord};
use crate::substream::trial_rng;
use crate::types::Parameters;

/// Sequential run with default settings for everything except the sweep.
pub fn run_experiment(
    sample_sizes: &[usize],
    iterations_per_size: usize,
    seed: u64,
) -> Result<ExperimentReport> {
    run_with_config(&ExperimentConfig {
        sample_sizes: sample_sizes.to_vec(),
        iterations_per_size,
        seed,
        parallel: false,
        ..Default::default()
    })
}

/// Parallel run with default settings for everything except the sweep.
pub fn run_experiment_parallel(
    sample_sizes: &[usize],
    iterations_per_size: usize,
    seed: u64,
) -> Result<ExperimentReport> {
    run_with_config(&ExperimentConfig {
        sample_sizes: sample_sizes.to_vec(),
        iterations_per_size,
        seed,
        parallel: true,
        ..Default::default()
    })
}

/// Validate `config` and run it in the mode it selects.
pub fn run_with_config(config: &ExperimentConfig) -> Result<ExperimentReport> {
    config.validate()?;

    let settings = TrialSettings {
        numeric: config.numeric,
        estimate_bounds: config.estimate_bounds,
    };

    info!(
        sample_sizes = ?config.sample_sizes,
        iterations = config.iterations_per_size,
        seed = config.seed,
        parallel = config.parallel,
        clipping = config.estimate_bounds.is_some(),
        "starting simulate-and-recover run"
    );
    let start = Instant::now();

    let mut results = Vec::with_capacity(config.sample_sizes.len());
    if config.parallel {
        for &n in &config.sample_sizes {
            let outcomes = run_size_parallel(config, &settings, n)?;
            results.push(summarize(config, n, outcomes));
        }
    } else {
        let mut rng = SmallRng::seed_from_u64(config.seed);
        for &n in &config.sample_sizes {
            let outcomes = run_size_sequential(config, &settings, n, &mut rng)?;
            results.push(summarize(config, n, outcomes));
        }
    }

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "run complete"
    );

    Ok(ExperimentReport {
        seed: config.seed,
        iterations_per_size: config.iterations_per_size,
        parallel: config.parallel,
        estimate_clipping: config.estimate_bounds.is_some(),
        results,
    })
}

fn run_size_sequential(
    config: &ExperimentConfig,
    settings: &TrialSettings,
    n: usize,
    rng: &mut SmallRng,
) -> Result<Vec<TrialOutcome>> {
    check_sample_size(n)?;
    info!(n, "running sample size");

    let mut outcomes = Vec::with_capacity(config.iterations_per_size);
    for i in 0..config.iterations_per_size {
        let truth = Parameters::sample_uniform(&config.parameter_ranges, rng);
        outcomes.push(evaluate_trial_with(&truth, n, rng, settings)?);
        if (i + 1) % PROGRESS_INTERVAL == 0 {
            debug!(n, iteration = i + 1, total = config.iterations_per_size, "progress");
        }
    }
    Ok(outcomes)
}

fn run_size_parallel(
    config: &ExperimentConfig,
    settings: &TrialSettings,
    n: usize,
) -> Result<Vec<TrialOutcome>> {
    check_sample_size(n)?;
    info!(n, threads = rayon::current_num_threads(), "running sample size");

    (0..config.iterations_per_size)
        .into_par_iter()
        .map(|i| {
            let mut rng = trial_rng(config.seed, n, i);
            let truth = Parameters::sample_uniform(&config.parameter_ranges, &mut rng);
            evaluate_trial_with(&truth, n, &mut rng, settings)
        })
        .collect()
}

fn check_sample_size(n: usize) -> Result<()> {
    if n < MIN_SAMPLE_SIZE {
        return Err(RecoveryError::InvalidSampleSize { n });
    }
    Ok(())
}

fn summarize(config: &ExperimentConfig, n: usize, outcomes: Vec<TrialOutcome>) -> SampleSizeReport {
    let mut acc = AggregateAccumulator::new(n);
    let mut trials = Vec::with_capacity(outcomes.len());
    for (i, outcome) in outcomes.iter().enumerate() {
        if let TrialOutcome::Degenerate { reason, .. } = outcome {
            debug!(n, iteration = i + 1, %reason, "degenerate trial");
        }
        acc.push(outcome);
        trials.push(TrialRecord::from_outcome(i + 1, outcome));
    }
    let stats = acc.finalize(config.degenerate_threshold);

    info!(
        n,
        bias_v = stats.mean_bias.v,
        bias_a = stats.mean_bias.a,
        bias_t = stats.mean_bias.t,
        mse = stats.mean_squared_error,
        degenerate = stats.degenerate,
        "sample size done"
    );
    if stats.untrustworthy {
        warn!(
            n,
            degenerate_fraction = stats.degenerate_fraction,
            threshold = config.degenerate_threshold,
            "too many degenerate trials, aggregates are not trustworthy"
        );
    }

    SampleSizeReport { stats, trials }
}
