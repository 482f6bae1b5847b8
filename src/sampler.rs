//! Observed-statistics sampler: one simulated experiment of N trials.
//!
//! Given predicted (R, M, V) and N, draws in this order from the caller's stream:
//!
//! ```text
//! T     ~ Binomial(N, clip(R, ε, 1-ε))          R_obs = T / N
//! M_obs ~ Normal(M, sqrt(max(V, ε) / N))
//! V_obs ~ Gamma(shape = (N-1)/2, scale = 2·max(V, ε) / (N-1))
//! ```
//!
//! Input that cannot describe an experiment (N < 2, non-finite statistics,
//! non-positive variance) is rejected with a domain-violation error. When the
//! variance draw itself is unusable, V_obs falls back to a bounded perturbation
//! of V and the fallback is reported in [`SampledStatistics::variance_fallback`].

use rand::Rng;
use rand_distr::{Binomial, Distribution, Gamma, Normal};

use crate::config::NumericPolicy;
use crate::constants::MIN_SAMPLE_SIZE;
use crate::error::{RecoveryError, Result};
use crate::types::{ObservedStatistics, PredictedStatistics};

/// One sampled realization plus what the sampler had to do to produce it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledStatistics {
    pub observed: ObservedStatistics,
    /// V_obs came from the bounded perturbation rather than the Gamma draw.
    pub variance_fallback: bool,
}

/// Sample observed statistics under the default numeric policy.
pub fn sample_observed<R: Rng + ?Sized>(
    predicted: &PredictedStatistics,
    n: usize,
    rng: &mut R,
) -> Result<SampledStatistics> {
    sample_observed_with(predicted, n, rng, &NumericPolicy::default())
}

pub fn sample_observed_with<R: Rng + ?Sized>(
    predicted: &PredictedStatistics,
    n: usize,
    rng: &mut R,
    policy: &NumericPolicy,
) -> Result<SampledStatistics> {
    validate_input(predicted, n)?;

    let eps = policy.probability;
    let p = predicted.r.clamp(eps, 1.0 - eps);
    let var = predicted.var.max(policy.variance_floor);
    let nf = n as f64;

    let binomial =
        Binomial::new(n as u64, p).map_err(|e| RecoveryError::Distribution(e.to_string()))?;
    let correct = binomial.sample(rng);
    let r_obs = correct as f64 / nf;

    let normal = Normal::new(predicted.m, (var / nf).sqrt())
        .map_err(|e| RecoveryError::Distribution(e.to_string()))?;
    let m_obs = normal.sample(rng);

    let shape = (nf - 1.0) / 2.0;
    let scale = 2.0 * var / (nf - 1.0);
    let drawn = match Gamma::new(shape, scale) {
        Ok(gamma) => Some(gamma.sample(rng)).filter(|&x| x.is_finite() && x > 0.0),
        Err(_) => None,
    };

    let (var_obs, variance_fallback) = match drawn {
        Some(x) => (x, false),
        None => {
            let s = policy.variance_fallback_spread;
            let factor = if s > 0.0 {
                rng.random_range(1.0 - s..=1.0 + s)
            } else {
                1.0
            };
            tracing::debug!(n, var, "variance draw unusable, perturbing predicted variance");
            (var * factor, true)
        }
    };

    Ok(SampledStatistics {
        observed: ObservedStatistics {
            r: r_obs,
            m: m_obs,
            var: var_obs,
        },
        variance_fallback,
    })
}

fn validate_input(predicted: &PredictedStatistics, n: usize) -> Result<()> {
    if n < MIN_SAMPLE_SIZE {
        return Err(RecoveryError::InvalidSampleSize { n });
    }
    if !predicted.is_finite() {
        return Err(RecoveryError::InvalidStatistics(format!(
            "predicted statistics must be finite, got R={}, M={}, V={}",
            predicted.r, predicted.m, predicted.var
        )));
    }
    if !(0.0..=1.0).contains(&predicted.r) {
        return Err(RecoveryError::InvalidStatistics(format!(
            "predicted accuracy must be in [0, 1], got {}",
            predicted.r
        )));
    }
    if predicted.var <= 0.0 {
        return Err(RecoveryError::InvalidStatistics(format!(
            "predicted variance must be positive, got {}",
            predicted.var
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn predicted() -> PredictedStatistics {
        PredictedStatistics::new(0.7, 0.4, 0.05)
    }

    #[test]
    fn test_rejects_small_n() {
        let mut rng = SmallRng::seed_from_u64(42);
        for n in [0, 1] {
            let err = sample_observed(&predicted(), n, &mut rng).unwrap_err();
            assert!(matches!(err, RecoveryError::InvalidSampleSize { .. }));
            assert!(err.is_domain_violation());
        }
    }

    #[test]
    fn test_rejects_non_positive_variance() {
        let mut rng = SmallRng::seed_from_u64(42);
        for var in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = sample_observed(&PredictedStatistics::new(0.7, 0.4, var), 40, &mut rng)
                .unwrap_err();
            assert!(err.is_domain_violation(), "var={var}: {err}");
        }
    }

    #[test]
    fn test_observed_in_domain() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1000 {
            let s = sample_observed(&predicted(), 40, &mut rng).unwrap();
            let o = s.observed;
            assert!(o.r >= 0.0 && o.r <= 1.0);
            assert!((o.r * 40.0 - (o.r * 40.0).round()).abs() < 1e-9);
            assert!(o.m.is_finite());
            assert!(o.var > 0.0 && o.var.is_finite());
            assert!(!s.variance_fallback);
        }
    }

    #[test]
    fn test_deterministic_given_seed() {
        let mut rng1 = SmallRng::seed_from_u64(123);
        let mut rng2 = SmallRng::seed_from_u64(123);
        for _ in 0..100 {
            let a = sample_observed(&predicted(), 10, &mut rng1).unwrap();
            let b = sample_observed(&predicted(), 10, &mut rng2).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_boundary_accuracy_is_clipped() {
        // R = 1 would give a zero-variance Binomial; clipping keeps the draw valid.
        let mut rng = SmallRng::seed_from_u64(9);
        let s = sample_observed(&PredictedStatistics::new(1.0, 0.4, 0.05), 100, &mut rng).unwrap();
        assert!(s.observed.r > 0.99);
    }

    #[test]
    fn test_overflowing_variance_falls_back() {
        // Gamma scale 2V/(N-1) overflows to inf at N = 2.
        let var = 1e308;
        let spread = NumericPolicy::default().variance_fallback_spread;
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let s = sample_observed(&PredictedStatistics::new(0.7, 0.4, var), 2, &mut rng).unwrap();
            assert!(s.variance_fallback, "seed {seed}");
            let v = s.observed.var;
            assert!(v.is_finite());
            assert!(v >= var * (1.0 - spread) && v <= var * (1.0 + spread), "V_obs={v}");
            assert!(s.observed.m.is_finite());
        }
    }

    #[test]
    fn test_zero_spread_fallback_returns_predicted_variance() {
        let policy = NumericPolicy {
            variance_fallback_spread: 0.0,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let s = sample_observed_with(&PredictedStatistics::new(0.7, 0.4, 1e308), 2, &mut rng, &policy)
            .unwrap();
        assert!(s.variance_fallback);
        assert_eq!(s.observed.var, 1e308);
    }

    #[test]
    fn test_large_n_concentrates() {
        let mut rng = SmallRng::seed_from_u64(42);
        let trials = 200;
        let mut sum = [0.0f64; 3];
        for _ in 0..trials {
            let o = sample_observed(&predicted(), 4000, &mut rng).unwrap().observed;
            sum[0] += o.r;
            sum[1] += o.m;
            sum[2] += o.var;
        }
        let mean = sum.map(|s| s / trials as f64);
        assert!((mean[0] - 0.7).abs() < 0.01, "R mean {}", mean[0]);
        assert!((mean[1] - 0.4).abs() < 0.01, "M mean {}", mean[1]);
        assert!((mean[2] - 0.05).abs() < 0.005, "V mean {}", mean[2]);
    }
}
