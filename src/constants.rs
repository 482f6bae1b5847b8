//! Model constants: epsilon defaults, parameter ranges, and run defaults.
//!
//! Maps model notation to concrete values:
//! - ε (all guards) = [`DEFAULT_EPSILON`] = 1e-10
//! - v, a ~ U[0.5, 2.0], t ~ U[0.1, 0.5] (generative ranges)
//! - v̂, â ∈ [0.1, 5.0], t̂ ∈ [0.01, 1.0] (optional estimate clamp)
//!
//! Every epsilon here is only a default. The values actually used by a run live
//! in [`crate::config::NumericPolicy`] so they can be changed per experiment.

/// Default magnitude for every numeric guard (zero drift, probability clip,
/// variance floor, fourth-root floor, drift clamp).
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// |a·v| below which the forward variance switches to its series expansion.
/// At 1e-2 the dropped O((av)⁴) term is ~1e-8 relative, while the closed form
/// has already lost ~1e-10 to cancellation.
pub const DEFAULT_VARIANCE_SERIES_THRESHOLD: f64 = 1e-2;

/// Relative half-width of the bounded perturbation used when the variance
/// draw cannot be produced: V_obs ∈ [V·(1-s), V·(1+s)].
pub const DEFAULT_VARIANCE_FALLBACK_SPREAD: f64 = 0.1;

/// Smallest trial count the sampler accepts. The Gamma shape (N-1)/2 must be positive.
pub const MIN_SAMPLE_SIZE: usize = 2;

/// Generative range for drift rate v.
pub const DRIFT_RANGE: (f64, f64) = (0.5, 2.0);

/// Generative range for boundary separation a.
pub const BOUNDARY_RANGE: (f64, f64) = (0.5, 2.0);

/// Generative range for non-decision time t.
pub const NONDECISION_RANGE: (f64, f64) = (0.1, 0.5);

/// Estimate clamp for v̂ and â.
pub const ESTIMATE_DRIFT_BOUNDS: (f64, f64) = (0.1, 5.0);
pub const ESTIMATE_BOUNDARY_BOUNDS: (f64, f64) = (0.1, 5.0);

/// Estimate clamp for t̂.
pub const ESTIMATE_NONDECISION_BOUNDS: (f64, f64) = (0.01, 1.0);

/// Sample sizes swept by a default run.
pub const DEFAULT_SAMPLE_SIZES: [usize; 3] = [10, 40, 4000];

/// Trials per sample size in a default run.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Master seed of a default run.
pub const DEFAULT_SEED: u64 = 42;

/// Fraction of degenerate trials above which a sample size is flagged
/// as statistically untrustworthy.
pub const DEFAULT_DEGENERATE_THRESHOLD: f64 = 0.05;

/// Progress is logged every this many iterations.
pub const PROGRESS_INTERVAL: usize = 100;

/// Parameter names in report order.
pub const PARAMETER_NAMES: [&str; 3] = ["v", "a", "t"];
