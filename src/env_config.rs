//! Environment overrides shared by the binary.
//!
//! Reads `EZ_SEED`, `EZ_OUTPUT_DIR`, `RAYON_NUM_THREADS` and `OMP_NUM_THREADS`.

use std::path::PathBuf;

use crate::config::ExperimentConfig;

/// Read `EZ_OUTPUT_DIR` (default `"results"`).
pub fn output_dir() -> PathBuf {
    std::env::var("EZ_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("results"))
}

/// Read `EZ_SEED` if set and parseable.
pub fn seed_override() -> Option<u64> {
    std::env::var("EZ_SEED").ok().and_then(|s| s.parse().ok())
}

/// Apply environment overrides to `config`.
pub fn apply_overrides(config: &mut ExperimentConfig) {
    if let Some(seed) = seed_override() {
        tracing::info!(seed, "seed overridden by EZ_SEED");
        config.seed = seed;
    }
}

/// Default worker count when neither thread variable is set.
const DEFAULT_THREADS: usize = 8;

/// Worker count from `RAYON_NUM_THREADS`, then `OMP_NUM_THREADS`.
pub fn thread_count() -> usize {
    pick_thread_count(
        std::env::var("RAYON_NUM_THREADS").ok(),
        std::env::var("OMP_NUM_THREADS").ok(),
    )
}

fn pick_thread_count(rayon: Option<String>, omp: Option<String>) -> usize {
    [rayon, omp]
        .into_iter()
        .flatten()
        .find_map(|s| s.trim().parse::<usize>().ok().filter(|&n| n > 0))
        .unwrap_or(DEFAULT_THREADS)
}

/// Size the global rayon pool for a parallel sweep. A pool that is already
/// built is kept as is. Returns the thread count the pool actually has.
pub fn init_thread_pool() -> usize {
    let requested = thread_count();
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(requested)
        .build_global()
    {
        tracing::debug!(error = %e, "global rayon pool already initialized");
    }
    let threads = rayon::current_num_threads();
    tracing::info!(requested, threads, "rayon pool ready");
    threads
}
