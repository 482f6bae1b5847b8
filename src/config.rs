//! Experiment configuration.
//!
//! Every knob of a run is a field here, including the numeric guards of the
//! forward/inverse models. All fields have defaults, so a JSON config file only
//! needs to name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{RecoveryError, Result};
use crate::types::Parameters;

/// Top-level configuration for one simulate-and-recover run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Trial counts N to sweep. Each must be ≥ 2.
    pub sample_sizes: Vec<usize>,
    /// Simulated experiments per sample size.
    pub iterations_per_size: usize,
    /// Master seed. The only source of randomness for the whole run.
    pub seed: u64,
    /// Run trials on the rayon pool with per-trial substreams.
    pub parallel: bool,
    /// Ranges the true parameters are drawn from.
    pub parameter_ranges: ParameterRanges,
    /// Epsilons for the forward, sampler and inverse guards.
    pub numeric: NumericPolicy,
    /// Clamp recovered parameters into these bounds before computing bias.
    /// `None` disables clipping.
    pub estimate_bounds: Option<EstimateBounds>,
    /// Degenerate fraction above which a sample size is flagged untrustworthy.
    pub degenerate_threshold: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            sample_sizes: DEFAULT_SAMPLE_SIZES.to_vec(),
            iterations_per_size: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            parallel: false,
            parameter_ranges: ParameterRanges::default(),
            numeric: NumericPolicy::default(),
            estimate_bounds: None,
            degenerate_threshold: DEFAULT_DEGENERATE_THRESHOLD,
        }
    }
}

impl ExperimentConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RecoveryError::io(format!("reading config {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_sizes.is_empty() {
            return Err(RecoveryError::Config("sample_sizes is empty".into()));
        }
        if let Some(&n) = self.sample_sizes.iter().find(|&&n| n < MIN_SAMPLE_SIZE) {
            return Err(RecoveryError::InvalidSampleSize { n });
        }
        if self.iterations_per_size == 0 {
            return Err(RecoveryError::Config(
                "iterations_per_size must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.degenerate_threshold) {
            return Err(RecoveryError::Config(format!(
                "degenerate_threshold must be in [0, 1], got {}",
                self.degenerate_threshold
            )));
        }
        self.parameter_ranges.validate()?;
        self.numeric.validate()?;
        if let Some(bounds) = &self.estimate_bounds {
            bounds.validate()?;
        }
        Ok(())
    }
}

/// Half-open sampling interval [lo, hi) for each parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRanges {
    pub v: (f64, f64),
    pub a: (f64, f64),
    pub t: (f64, f64),
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            v: DRIFT_RANGE,
            a: BOUNDARY_RANGE,
            t: NONDECISION_RANGE,
        }
    }
}

impl ParameterRanges {
    pub fn validate(&self) -> Result<()> {
        for (name, (lo, hi)) in [("v", self.v), ("a", self.a), ("t", self.t)] {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(RecoveryError::Config(format!(
                    "range for {name} must be finite with lo < hi, got [{lo}, {hi})"
                )));
            }
        }
        if self.v.0 <= 0.0 || self.a.0 <= 0.0 || self.t.0 < 0.0 {
            return Err(RecoveryError::Config(
                "v and a ranges must be positive, t range non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Closed clamp interval for recovered parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateBounds {
    pub v: (f64, f64),
    pub a: (f64, f64),
    pub t: (f64, f64),
}

impl Default for EstimateBounds {
    fn default() -> Self {
        Self {
            v: ESTIMATE_DRIFT_BOUNDS,
            a: ESTIMATE_BOUNDARY_BOUNDS,
            t: ESTIMATE_NONDECISION_BOUNDS,
        }
    }
}

impl EstimateBounds {
    pub fn validate(&self) -> Result<()> {
        for (name, (lo, hi)) in [("v", self.v), ("a", self.a), ("t", self.t)] {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(RecoveryError::Config(format!(
                    "estimate bounds for {name} must be finite with lo <= hi, got [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }

    /// Clamp each component. Returns the clamped parameters and whether any
    /// component moved. NaN components are pulled to the lower bound.
    pub fn clamp(&self, p: &Parameters) -> (Parameters, bool) {
        let clamped = Parameters {
            v: clamp_component(p.v, self.v),
            a: clamp_component(p.a, self.a),
            t: clamp_component(p.t, self.t),
        };
        let moved = clamped.v != p.v || clamped.a != p.a || clamped.t != p.t;
        (clamped, moved)
    }
}

fn clamp_component(x: f64, (lo, hi): (f64, f64)) -> f64 {
    if x.is_nan() {
        lo
    } else {
        x.clamp(lo, hi)
    }
}

/// Numeric guards shared by the forward model, sampler and inverse model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericPolicy {
    /// Substituted for v = 0 in the forward model.
    pub zero_drift: f64,
    /// R is clipped into [ε, 1-ε] before Binomial sampling and log-odds.
    pub probability: f64,
    /// Predicted variance floor before computing Normal stddev / Gamma scale.
    pub variance_floor: f64,
    /// Substituted when the fourth-root argument is ≤ 0.
    pub root_floor: f64,
    /// Minimum |v̂| before dividing to get â.
    pub drift_floor: f64,
    /// Below this |a·v| the forward variance uses its series expansion.
    pub variance_series_threshold: f64,
    /// Relative half-width of the fallback perturbation for V_obs.
    pub variance_fallback_spread: f64,
}

impl Default for NumericPolicy {
    fn default() -> Self {
        Self {
            zero_drift: DEFAULT_EPSILON,
            probability: DEFAULT_EPSILON,
            variance_floor: DEFAULT_EPSILON,
            root_floor: DEFAULT_EPSILON,
            drift_floor: DEFAULT_EPSILON,
            variance_series_threshold: DEFAULT_VARIANCE_SERIES_THRESHOLD,
            variance_fallback_spread: DEFAULT_VARIANCE_FALLBACK_SPREAD,
        }
    }
}

impl NumericPolicy {
    pub fn validate(&self) -> Result<()> {
        let eps = [
            ("zero_drift", self.zero_drift),
            ("probability", self.probability),
            ("variance_floor", self.variance_floor),
            ("root_floor", self.root_floor),
            ("drift_floor", self.drift_floor),
            ("variance_series_threshold", self.variance_series_threshold),
        ];
        for (name, value) in eps {
            if !(value > 0.0 && value < 0.5) {
                return Err(RecoveryError::Config(format!(
                    "numeric.{name} must be in (0, 0.5), got {value}"
                )));
            }
        }
        if !(self.variance_fallback_spread >= 0.0 && self.variance_fallback_spread < 1.0) {
            return Err(RecoveryError::Config(format!(
                "numeric.variance_fallback_spread must be in [0, 1), got {}",
                self.variance_fallback_spread
            )));
        }
        Ok(())
    }
}
