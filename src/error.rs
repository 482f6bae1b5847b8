//! Error types for the simulate-and-recover pipeline.
//!
//! Taxonomy:
//! - Domain violations: misconfiguration (N < 2, non-positive variance). Never suppressed.
//! - Trial failures: a distribution could not be built from the inputs. The
//!   evaluator turns these into degenerate trials.
//! - I/O: report writing and config loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    // ── Domain violations ───────────────────────────────────────────────
    #[error("Sample size must be at least 2, got {n}")]
    InvalidSampleSize { n: usize },

    #[error("Invalid statistics: {0}")]
    InvalidStatistics(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    // ── Configuration ───────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Trial failures ──────────────────────────────────────────────────
    #[error("Distribution error: {0}")]
    Distribution(String),

    // ── I/O ─────────────────────────────────────────────────────────────
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RecoveryError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Domain violations indicate misconfiguration, not model noise, and must
    /// abort a run rather than be folded into a degenerate trial.
    pub fn is_domain_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSampleSize { .. } | Self::InvalidStatistics(_) | Self::InvalidParameters(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
