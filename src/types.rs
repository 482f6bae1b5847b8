//! Data model: generative parameters, summary statistics, and bias vectors.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ParameterRanges;

/// EZ-diffusion parameters (v, a, t).
///
/// One instance is the true generative source of a trial; a second, structurally
/// identical instance is the estimate produced by inversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Drift rate.
    pub v: f64,
    /// Boundary separation.
    pub a: f64,
    /// Non-decision time.
    pub t: f64,
}

impl Parameters {
    pub fn new(v: f64, a: f64, t: f64) -> Self {
        Self { v, a, t }
    }

    /// Draw (v, a, t) uniformly within `ranges`, in that order.
    pub fn sample_uniform<R: Rng + ?Sized>(ranges: &ParameterRanges, rng: &mut R) -> Self {
        let v = rng.random_range(ranges.v.0..ranges.v.1);
        let a = rng.random_range(ranges.a.0..ranges.a.1);
        let t = rng.random_range(ranges.t.0..ranges.t.1);
        Self { v, a, t }
    }

    pub fn is_finite(&self) -> bool {
        self.v.is_finite() && self.a.is_finite() && self.t.is_finite()
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.v, self.a, self.t]
    }
}

/// Summary statistics (R, M, V) of a two-choice response-time experiment.
///
/// Used for both the model prediction and one sampled realization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Accuracy, strictly inside (0, 1).
    pub r: f64,
    /// Mean response time.
    pub m: f64,
    /// Response-time variance, strictly positive.
    pub var: f64,
}

impl Statistics {
    pub fn new(r: f64, m: f64, var: f64) -> Self {
        Self { r, m, var }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.m.is_finite() && self.var.is_finite()
    }

    /// True when the statistics lie in the domain the inverse model expects:
    /// 0 < R < 1, M > 0, V > 0.
    pub fn in_domain(&self) -> bool {
        self.is_finite() && self.r > 0.0 && self.r < 1.0 && self.m > 0.0 && self.var > 0.0
    }
}

/// Noise-free statistics derived from true parameters.
pub type PredictedStatistics = Statistics;

/// Statistics sampled from a finite experiment of N trials.
pub type ObservedStatistics = Statistics;

/// Component-wise `true - estimated`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bias {
    pub v: f64,
    pub a: f64,
    pub t: f64,
}

impl Bias {
    pub fn between(truth: &Parameters, estimated: &Parameters) -> Self {
        Self {
            v: truth.v - estimated.v,
            a: truth.a - estimated.a,
            t: truth.t - estimated.t,
        }
    }

    /// Σ bias_i².
    pub fn squared_norm(&self) -> f64 {
        self.v * self.v + self.a * self.a + self.t * self.t
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.v, self.a, self.t]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_bias_is_true_minus_estimated() {
        let truth = Parameters::new(1.0, 1.0, 0.3);
        let est = Parameters::new(1.1, 0.9, 0.3);
        let b = Bias::between(&truth, &est);
        assert!((b.v + 0.1).abs() < 1e-12);
        assert!((b.a - 0.1).abs() < 1e-12);
        assert_eq!(b.t, 0.0);
        assert!((b.squared_norm() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_sample_uniform_in_range() {
        let ranges = ParameterRanges::default();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1000 {
            let p = Parameters::sample_uniform(&ranges, &mut rng);
            assert!(p.v >= 0.5 && p.v < 2.0, "v={}", p.v);
            assert!(p.a >= 0.5 && p.a < 2.0, "a={}", p.a);
            assert!(p.t >= 0.1 && p.t < 0.5, "t={}", p.t);
        }
    }

    #[test]
    fn test_in_domain() {
        assert!(Statistics::new(0.7, 0.5, 0.1).in_domain());
        assert!(!Statistics::new(1.0, 0.5, 0.1).in_domain());
        assert!(!Statistics::new(0.7, 0.5, 0.0).in_domain());
        assert!(!Statistics::new(0.7, f64::NAN, 0.1).in_domain());
    }
}
