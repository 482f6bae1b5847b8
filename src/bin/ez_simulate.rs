//! ez-simulate: run the EZ-diffusion simulate-and-recover study.
//!
//! ```text
//! ez-simulate sweep [--config FILE] [--sample-sizes 10,40,4000] [--iterations 1000]
//!                   [--seed 42] [--parallel] [--clip-estimates] [--output DIR]
//! ez-simulate trial <a> <v> <t> <N> [--seed 42]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use ez_recovery::config::{EstimateBounds, ExperimentConfig};
use ez_recovery::evaluator::TrialOutcome;
use ez_recovery::report::{render_summary, save_report};
use ez_recovery::{env_config, evaluate_trial, run_with_config, Parameters};

#[derive(Parser)]
#[command(name = "ez-simulate")]
#[command(version)]
#[command(about = "Simulate-and-recover validation of the EZ-diffusion model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep sample sizes and report aggregate bias and squared error
    Sweep {
        /// JSON configuration file (fields not given keep their defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Comma-separated sample sizes
        #[arg(long, value_delimiter = ',')]
        sample_sizes: Option<Vec<usize>>,

        /// Iterations per sample size
        #[arg(short, long)]
        iterations: Option<usize>,

        /// Master RNG seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Run trials in parallel with per-trial substreams
        #[arg(long)]
        parallel: bool,

        /// Clamp estimates into v,a ∈ [0.1, 5], t ∈ [0.01, 1] before computing bias
        #[arg(long)]
        clip_estimates: bool,

        /// Output directory (default: $EZ_OUTPUT_DIR or ./results)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a single trial for given true parameters
    Trial {
        /// Boundary separation
        a: f64,
        /// Drift rate
        v: f64,
        /// Non-decision time
        t: f64,
        /// Number of simulated responses
        n: usize,

        /// RNG seed
        #[arg(short, long, default_value_t = ez_recovery::constants::DEFAULT_SEED)]
        seed: u64,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sweep {
            config,
            sample_sizes,
            iterations,
            seed,
            parallel,
            clip_estimates,
            output,
        } => sweep(
            config,
            sample_sizes,
            iterations,
            seed,
            parallel,
            clip_estimates,
            output,
        ),
        Commands::Trial { a, v, t, n, seed } => trial(Parameters::new(v, a, t), n, seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn sweep(
    config_path: Option<PathBuf>,
    sample_sizes: Option<Vec<usize>>,
    iterations: Option<usize>,
    seed: Option<u64>,
    parallel: bool,
    clip_estimates: bool,
    output: Option<PathBuf>,
) -> ez_recovery::Result<()> {
    let mut config = match config_path {
        Some(path) => ExperimentConfig::from_json_file(&path)?,
        None => ExperimentConfig::default(),
    };
    env_config::apply_overrides(&mut config);
    if let Some(sizes) = sample_sizes {
        config.sample_sizes = sizes;
    }
    if let Some(iterations) = iterations {
        config.iterations_per_size = iterations;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.parallel |= parallel;
    if clip_estimates && config.estimate_bounds.is_none() {
        config.estimate_bounds = Some(EstimateBounds::default());
    }
    if config.parallel {
        env_config::init_thread_pool();
    }

    let t0 = Instant::now();
    let report = run_with_config(&config)?;
    let elapsed = t0.elapsed();

    print!("{}", render_summary(&report));
    println!("Elapsed: {:.1} ms", elapsed.as_secs_f64() * 1000.0);

    let dir = output.unwrap_or_else(env_config::output_dir);
    let written = save_report(&report, &dir)?;
    info!(files = written.len(), dir = %dir.display(), "results saved");

    let flagged = report.untrustworthy_sizes();
    if !flagged.is_empty() {
        println!(
            "WARNING: sample sizes {:?} exceeded the degenerate-trial threshold",
            flagged
        );
    }
    Ok(())
}

fn trial(truth: Parameters, n: usize, seed: u64) -> ez_recovery::Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    match evaluate_trial(&truth, n, &mut rng)? {
        TrialOutcome::Recovered(r) => {
            println!(
                "True:      v={:.6}  a={:.6}  t={:.6}",
                truth.v, truth.a, truth.t
            );
            println!(
                "Predicted: R={:.6}  M={:.6}  V={:.6}",
                r.predicted.r, r.predicted.m, r.predicted.var
            );
            println!(
                "Observed:  R={:.6}  M={:.6}  V={:.6}",
                r.observed.r, r.observed.m, r.observed.var
            );
            println!(
                "Estimated: v={:.6}  a={:.6}  t={:.6}",
                r.estimated.v, r.estimated.a, r.estimated.t
            );
            println!(
                "Bias:      v={:+.6}  a={:+.6}  t={:+.6}",
                r.bias.v, r.bias.a, r.bias.t
            );
            println!("Squared error: {:.6}", r.squared_error);
            if r.diagnostics.inverse.any() || r.diagnostics.variance_fallback {
                println!("Guards: {:?}", r.diagnostics);
            }
        }
        TrialOutcome::Degenerate { reason, .. } => {
            println!("Degenerate trial: {reason}");
        }
    }
    Ok(())
}
