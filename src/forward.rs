//! Forward EZ-diffusion model: (v, a, t) → predicted (R, M, V).
//!
//! Closed-form equations with y = exp(-a·v):
//!
//! ```text
//! R = 1 / (1 + y)
//! M = t + (a / 2v) · (1 - y) / (1 + y)
//! V = (a / 2v³) · (1 - 2av·y - y²) / (1 + y)²
//! ```
//!
//! Pure, no randomness. v = 0 is replaced by [`NumericPolicy::zero_drift`] so
//! that R tends to 0.5 instead of dividing by zero.
//!
//! The numerator of V cancels to O((av)³) as av → 0, and in f64 it collapses to
//! zero long before av does. Below [`NumericPolicy::variance_series_threshold`]
//! V is taken from its series instead:
//!
//! ```text
//! V = (a⁴ / 24) · (1 - (av)² / 5) + O((av)⁴)
//! ```

use crate::config::NumericPolicy;
use crate::types::{Parameters, PredictedStatistics};

/// Predicted statistics under the default numeric policy.
pub fn forward(params: &Parameters) -> PredictedStatistics {
    forward_with(params, &NumericPolicy::default())
}

pub fn forward_with(params: &Parameters, policy: &NumericPolicy) -> PredictedStatistics {
    let v = if params.v == 0.0 {
        policy.zero_drift
    } else {
        params.v
    };
    let a = params.a;

    let y = (-a * v).exp();
    let r = 1.0 / (1.0 + y);
    let m = params.t + (a / (2.0 * v)) * ((1.0 - y) / (1.0 + y));
    let x = a * v;
    let var = if x.abs() < policy.variance_series_threshold {
        a.powi(4) / 24.0 * (1.0 - x * x / 5.0)
    } else {
        (a / (2.0 * v.powi(3))) * ((1.0 - 2.0 * x * y - y * y) / (1.0 + y).powi(2))
    };

    PredictedStatistics { r, m, var }
}
