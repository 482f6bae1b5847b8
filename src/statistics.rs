//! Aggregation of trial outcomes into per-sample-size statistics.
//!
//! Means are taken over recovered trials only. Degenerate trials are counted
//! and kept in the audit table, but never enter the bias or error means, since
//! their zero-bias placeholder would drag the averages toward zero.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::evaluator::{DegenerateReason, TrialDiagnostics, TrialOutcome};
use crate::types::{Bias, Parameters};

// ── Per-trial audit rows ────────────────────────────────────────────

/// One row of the audit table. Degenerate trials carry `estimated = truth`,
/// zero bias and zero squared error, and are tagged by `degenerate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub iteration: usize,
    pub truth: Parameters,
    pub estimated: Parameters,
    pub bias: Bias,
    pub squared_error: f64,
    pub diagnostics: TrialDiagnostics,
    pub degenerate: Option<DegenerateReason>,
}

impl TrialRecord {
    pub fn from_outcome(iteration: usize, outcome: &TrialOutcome) -> Self {
        match outcome {
            TrialOutcome::Recovered(r) => Self {
                iteration,
                truth: r.truth,
                estimated: r.estimated,
                bias: r.bias,
                squared_error: r.squared_error,
                diagnostics: r.diagnostics,
                degenerate: None,
            },
            TrialOutcome::Degenerate { truth, reason } => Self {
                iteration,
                truth: *truth,
                estimated: *truth,
                bias: Bias::default(),
                squared_error: 0.0,
                diagnostics: TrialDiagnostics::default(),
                degenerate: Some(reason.clone()),
            },
        }
    }
}

// ── Aggregates ──────────────────────────────────────────────────────

/// How often each numeric guard fired across recovered trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub probability_clipped: u64,
    pub root_floored: u64,
    pub drift_clamped: u64,
    pub nondecision_floored: u64,
    pub variance_fallbacks: u64,
    pub estimates_clipped: u64,
}

impl DiagnosticCounts {
    fn record(&mut self, d: &TrialDiagnostics) {
        self.probability_clipped += d.inverse.probability_clipped as u64;
        self.root_floored += d.inverse.root_floored as u64;
        self.drift_clamped += d.inverse.drift_clamped as u64;
        self.nondecision_floored += d.inverse.nondecision_floored as u64;
        self.variance_fallbacks += d.variance_fallback as u64;
        self.estimates_clipped += d.estimate_clipped as u64;
    }
}

/// Mean squared error of each parameter separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ParameterErrors {
    pub v: f64,
    pub a: f64,
    pub t: f64,
}

/// Finalized statistics for one sample size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub sample_size: usize,
    pub trials: u64,
    pub recovered: u64,
    pub degenerate: u64,
    pub degenerate_fraction: f64,
    /// Too many degenerate trials for the means to be trusted.
    pub untrustworthy: bool,
    /// Mean of `truth - estimated` over recovered trials (NaN if none).
    pub mean_bias: Bias,
    /// Mean of Σ bias² over recovered trials (NaN if none).
    pub mean_squared_error: f64,
    pub mean_squared_error_by_parameter: ParameterErrors,
    pub diagnostics: DiagnosticCounts,
}

/// Streaming accumulator, one per sample size.
#[derive(Debug, Clone)]
pub struct AggregateAccumulator {
    sample_size: usize,
    trials: u64,
    recovered: u64,
    degenerate: u64,
    bias_sum: [f64; 3],
    squared_sum: [f64; 3],
    squared_error_sum: f64,
    diagnostics: DiagnosticCounts,
}

impl AggregateAccumulator {
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            trials: 0,
            recovered: 0,
            degenerate: 0,
            bias_sum: [0.0; 3],
            squared_sum: [0.0; 3],
            squared_error_sum: 0.0,
            diagnostics: DiagnosticCounts::default(),
        }
    }

    pub fn push(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        match outcome {
            TrialOutcome::Recovered(r) => {
                self.recovered += 1;
                for (i, b) in r.bias.as_array().into_iter().enumerate() {
                    self.bias_sum[i] += b;
                    self.squared_sum[i] += b * b;
                }
                self.squared_error_sum += r.squared_error;
                self.diagnostics.record(&r.diagnostics);
            }
            TrialOutcome::Degenerate { .. } => {
                self.degenerate += 1;
            }
        }
    }

    pub fn finalize(self, degenerate_threshold: f64) -> AggregateStats {
        let k = self.recovered as f64;
        let mean = |sum: f64| if self.recovered == 0 { f64::NAN } else { sum / k };
        let degenerate_fraction = if self.trials == 0 {
            0.0
        } else {
            self.degenerate as f64 / self.trials as f64
        };

        AggregateStats {
            sample_size: self.sample_size,
            trials: self.trials,
            recovered: self.recovered,
            degenerate: self.degenerate,
            degenerate_fraction,
            untrustworthy: self.recovered == 0 || degenerate_fraction > degenerate_threshold,
            mean_bias: Bias {
                v: mean(self.bias_sum[0]),
                a: mean(self.bias_sum[1]),
                t: mean(self.bias_sum[2]),
            },
            mean_squared_error: mean(self.squared_error_sum),
            mean_squared_error_by_parameter: ParameterErrors {
                v: mean(self.squared_sum[0]),
                a: mean(self.squared_sum[1]),
                t: mean(self.squared_sum[2]),
            },
            diagnostics: self.diagnostics,
        }
    }
}

// ── Run report ──────────────────────────────────────────────────────

/// Aggregates plus the full audit table for one sample size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSizeReport {
    pub stats: AggregateStats,
    pub trials: Vec<TrialRecord>,
}

/// Result of a complete run, in configured sample-size order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub seed: u64,
    pub iterations_per_size: usize,
    pub parallel: bool,
    pub estimate_clipping: bool,
    pub results: Vec<SampleSizeReport>,
}

impl ExperimentReport {
    /// `{N: AggregateStats}` view of the run.
    pub fn aggregates(&self) -> BTreeMap<usize, &AggregateStats> {
        self.results
            .iter()
            .map(|r| (r.stats.sample_size, &r.stats))
            .collect()
    }

    pub fn get(&self, sample_size: usize) -> Option<&SampleSizeReport> {
        self.results
            .iter()
            .find(|r| r.stats.sample_size == sample_size)
    }

    pub fn untrustworthy_sizes(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| r.stats.untrustworthy)
            .map(|r| r.stats.sample_size)
            .collect()
    }

    pub fn total_degenerate(&self) -> u64 {
        self.results.iter().map(|r| r.stats.degenerate).sum()
    }
}
