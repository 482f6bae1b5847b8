//! # EZ-diffusion simulate-and-recover
//!
//! Validates the EZ-diffusion model by simulation: draw true parameters,
//! predict summary statistics, sample a finite experiment, invert, and measure
//! how far the estimate lands from the truth.
//!
//! ## Pipeline
//!
//! | Step | Rust module | Description |
//! |------|-------------|-------------|
//! | Forward | [`forward`] | (v, a, t) → predicted (R, M, V), closed form |
//! | Sample | [`sampler`] | predicted (R, M, V) + N → observed (R, M, V) via Binomial / Normal / Gamma |
//! | Inverse | [`inverse`] | observed (R, M, V) → (v̂, â, t̂), four guarded closed-form steps |
//! | Evaluate | [`evaluator`] | one trial, tagged `Recovered` or `Degenerate` |
//! | Drive | [`driver`] | iterations × sample sizes, sequential or rayon |
//! | Aggregate | [`statistics`] | mean bias, MSE, guard counters, audit rows |
//!
//! ## Reproducibility
//!
//! The master seed is the only source of randomness. Sequential runs consume
//! one `SmallRng` in `(N, iteration)` order; parallel runs give every trial a
//! substream derived from `(seed, N, iteration)` ([`substream`]).
//!
//! ## Numeric guards
//!
//! The epsilons protecting log-odds, the fourth root, the drift division and
//! the sampler's variance terms are fields of [`config::NumericPolicy`], not
//! hard-coded. Every time a guard fires it is counted in the aggregates.

pub mod config;
pub mod constants;
pub mod driver;
pub mod env_config;
pub mod error;
pub mod evaluator;
pub mod forward;
pub mod inverse;
pub mod report;
pub mod sampler;
pub mod statistics;
pub mod substream;
pub mod types;

pub use config::{EstimateBounds, ExperimentConfig, NumericPolicy, ParameterRanges};
pub use driver::{run_experiment, run_experiment_parallel, run_with_config};
pub use error::{RecoveryError, Result};
pub use evaluator::{evaluate_trial, evaluate_trial_with, RecoveryResult, TrialOutcome};
pub use forward::{forward, forward_with};
pub use inverse::{inverse, inverse_with, InverseEstimate};
pub use sampler::{sample_observed, sample_observed_with, SampledStatistics};
pub use statistics::{AggregateStats, ExperimentReport};
pub use types::{Bias, ObservedStatistics, Parameters, PredictedStatistics, Statistics};
