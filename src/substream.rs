//! Per-trial random substreams derived from the master seed.
//!
//! Parallel runs give each trial its own generator so that results do not
//! depend on scheduling. The trial generator is seeded from
//! `(master seed, sample size, trial index)` by chaining the SplitMix64
//! finalizer over the three keys.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Seed for trial `trial` at sample size `sample_size`.
///
/// Each key is folded into the finalized previous one, so nearby
/// `(sample_size, trial)` pairs land far apart.
pub fn substream_seed(master: u64, sample_size: usize, trial: usize) -> u64 {
    [sample_size as u64, trial as u64]
        .into_iter()
        .fold(mix(master), |acc, key| mix(acc ^ key))
}

/// SplitMix64 output function: golden-ratio increment, then two
/// xor-shift-multiply rounds.
fn mix(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Generator for one trial of a parallel run.
pub fn trial_rng(master: u64, sample_size: usize, trial: usize) -> SmallRng {
    SmallRng::seed_from_u64(substream_seed(master, sample_size, trial))
}
