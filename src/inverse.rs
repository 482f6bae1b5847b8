//! Inverse EZ-diffusion model: observed (R, M, V) → estimated (v, a, t).
//!
//! Four closed-form steps, constant time, no iteration:
//!
//! ```text
//! R' = clip(R, ε, 1-ε)
//! L  = ln(R' / (1 - R'))
//! v̂  = sign(R' - ½) · (L·(R'²L - R'L + R' - ½) / V)^¼
//! â  = L / v̂
//! t̂  = M - (â / 2v̂) · (1 - ŷ) / (1 + ŷ),   ŷ = exp(-v̂·â)
//! ```
//!
//! ## Guards
//!
//! | Step | Condition | Action | Flag |
//! |------|-----------|--------|------|
//! | 1 | R ∉ (ε, 1-ε) | clip R | `probability_clipped` |
//! | 2 | fourth-root argument ≤ 0 | substitute ε | `root_floored` |
//! | 3 | \|v̂\| < ε | v̂ = ±ε, sign kept | `drift_clamped` |
//! | 4 | t̂ < 0 | t̂ = 0 | `nondecision_floored` |
//!
//! Each guard only recovers; none of them is an error. The flags let callers
//! count how often the recovery path was taken.

use serde::{Deserialize, Serialize};

use crate::config::NumericPolicy;
use crate::types::{ObservedStatistics, Parameters};

/// Which numeric guards fired during one inversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverseDiagnostics {
    pub probability_clipped: bool,
    pub root_floored: bool,
    pub drift_clamped: bool,
    pub nondecision_floored: bool,
}

impl InverseDiagnostics {
    pub fn any(&self) -> bool {
        self.probability_clipped
            || self.root_floored
            || self.drift_clamped
            || self.nondecision_floored
    }
}

/// Recovered parameters and the guards used to reach them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseEstimate {
    pub params: Parameters,
    pub diagnostics: InverseDiagnostics,
}

/// Invert observed statistics under the default numeric policy.
pub fn inverse(observed: &ObservedStatistics) -> InverseEstimate {
    inverse_with(observed, &NumericPolicy::default())
}

pub fn inverse_with(observed: &ObservedStatistics, policy: &NumericPolicy) -> InverseEstimate {
    let mut diagnostics = InverseDiagnostics::default();

    // Step 1: log-odds of the clipped accuracy.
    let eps = policy.probability;
    let r = observed.r.clamp(eps, 1.0 - eps);
    diagnostics.probability_clipped = r != observed.r;
    let logit = (r / (1.0 - r)).ln();

    // Step 2: drift from the fourth root.
    let mut x = logit * (r * r * logit - r * logit + r - 0.5) / observed.var;
    if x.is_nan() || x <= 0.0 {
        x = policy.root_floor;
        diagnostics.root_floored = true;
    }
    let mut v = sign(r - 0.5) * x.powf(0.25);

    // Step 3: boundary separation.
    if v.abs() < policy.drift_floor {
        v = if v < 0.0 {
            -policy.drift_floor
        } else {
            policy.drift_floor
        };
        diagnostics.drift_clamped = true;
    }
    let a = logit / v;

    // Step 4: non-decision time.
    let y = (-v * a).exp();
    let mut t = observed.m - (a / (2.0 * v)) * ((1.0 - y) / (1.0 + y));
    if t < 0.0 {
        t = 0.0;
        diagnostics.nondecision_floored = true;
    }

    InverseEstimate {
        params: Parameters { v, a, t },
        diagnostics,
    }
}

/// Sign with sign(0) = 0; `f64::signum` maps 0 to 1.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
