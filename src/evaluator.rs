//! Recovery evaluator: one simulate-and-recover trial.
//!
//! forward → sample → inverse → (optional clamp) → bias.
//!
//! Outcomes are tagged. A trial whose pipeline breaks for a reason other than
//! bad input (a distribution could not be built, the estimate is not finite)
//! becomes [`TrialOutcome::Degenerate`] instead of aborting the run. Domain
//! violations are returned as errors.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{EstimateBounds, NumericPolicy};
use crate::error::{RecoveryError, Result};
use crate::forward::forward_with;
use crate::inverse::{inverse_with, InverseDiagnostics};
use crate::sampler::sample_observed_with;
use crate::types::{Bias, ObservedStatistics, Parameters, PredictedStatistics};

/// Evaluator settings shared by every trial of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrialSettings {
    pub numeric: NumericPolicy,
    pub estimate_bounds: Option<EstimateBounds>,
}

/// Successful recovery of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryResult {
    pub truth: Parameters,
    pub predicted: PredictedStatistics,
    pub observed: ObservedStatistics,
    /// Estimate after optional clamping; bias is computed from this.
    pub estimated: Parameters,
    /// `truth - estimated`, component-wise.
    pub bias: Bias,
    /// Σ bias².
    pub squared_error: f64,
    pub diagnostics: TrialDiagnostics,
}

/// Everything the numeric guards did during one trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDiagnostics {
    pub inverse: InverseDiagnostics,
    pub variance_fallback: bool,
    /// The raw estimate fell outside the configured bounds and was clamped.
    pub estimate_clipped: bool,
}

/// Why a trial produced no usable estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum DegenerateReason {
    /// The forward model returned non-finite statistics.
    NonFinitePrediction,
    /// A sampling distribution could not be constructed.
    Sampling(String),
    /// The inverse model returned a non-finite estimate.
    NonFiniteEstimate,
}

impl std::fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinitePrediction => write!(f, "non-finite prediction"),
            Self::Sampling(msg) => write!(f, "sampling failed: {msg}"),
            Self::NonFiniteEstimate => write!(f, "non-finite estimate"),
        }
    }
}

/// Tagged result of one trial.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Recovered(RecoveryResult),
    Degenerate {
        truth: Parameters,
        reason: DegenerateReason,
    },
}

impl TrialOutcome {
    pub fn truth(&self) -> &Parameters {
        match self {
            Self::Recovered(r) => &r.truth,
            Self::Degenerate { truth, .. } => truth,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate { .. })
    }

    pub fn recovered(&self) -> Option<&RecoveryResult> {
        match self {
            Self::Recovered(r) => Some(r),
            Self::Degenerate { .. } => None,
        }
    }
}

/// Run one trial with default settings.
pub fn evaluate_trial<R: Rng + ?Sized>(
    truth: &Parameters,
    n: usize,
    rng: &mut R,
) -> Result<TrialOutcome> {
    evaluate_trial_with(truth, n, rng, &TrialSettings::default())
}

pub fn evaluate_trial_with<R: Rng + ?Sized>(
    truth: &Parameters,
    n: usize,
    rng: &mut R,
    settings: &TrialSettings,
) -> Result<TrialOutcome> {
    let degenerate = |reason: DegenerateReason| -> Result<TrialOutcome> {
        Ok(TrialOutcome::Degenerate {
            truth: *truth,
            reason,
        })
    };

    let predicted = forward_with(truth, &settings.numeric);
    if !predicted.is_finite() {
        return degenerate(DegenerateReason::NonFinitePrediction);
    }

    let sampled = match sample_observed_with(&predicted, n, rng, &settings.numeric) {
        Ok(s) => s,
        Err(e) if e.is_domain_violation() => return Err(e),
        Err(RecoveryError::Distribution(msg)) => {
            return degenerate(DegenerateReason::Sampling(msg));
        }
        Err(e) => return degenerate(DegenerateReason::Sampling(e.to_string())),
    };

    let raw = inverse_with(&sampled.observed, &settings.numeric);
    if !raw.params.is_finite() {
        return degenerate(DegenerateReason::NonFiniteEstimate);
    }

    let (estimated, estimate_clipped) = match &settings.estimate_bounds {
        Some(bounds) => bounds.clamp(&raw.params),
        None => (raw.params, false),
    };

    let bias = Bias::between(truth, &estimated);
    Ok(TrialOutcome::Recovered(RecoveryResult {
        truth: *truth,
        predicted,
        observed: sampled.observed,
        estimated,
        bias,
        squared_error: bias.squared_norm(),
        diagnostics: TrialDiagnostics {
            inverse: raw.diagnostics,
            variance_fallback: sampled.variance_fallback,
            estimate_clipped,
        },
    }))
}
