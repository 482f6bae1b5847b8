//! Report writer: human-readable summary, per-N audit tables, JSON dump.
//!
//! Output layout under the chosen directory:
//!
//! ```text
//! summary.txt          aggregate bias / MSE per sample size
//! summary.json         full ExperimentReport (aggregates + every trial)
//! results_N{N}.csv     one row per trial
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{RecoveryError, Result};
use crate::statistics::{ExperimentReport, SampleSizeReport};

const CSV_HEADER: &str = "iteration,v_true,a_true,t_true,v_est,a_est,t_est,\
bias_v,bias_a,bias_t,squared_error,degenerate,probability_clipped,root_floored,\
drift_clamped,nondecision_floored,variance_fallback,estimate_clipped";

/// Plain-text summary of every sample size.
pub fn render_summary(report: &ExperimentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "EZ Diffusion Simulate-and-Recover Results");
    let _ = writeln!(out, "=========================================");
    let _ = writeln!(
        out,
        "seed: {}, iterations per size: {}, mode: {}, estimate clipping: {}",
        report.seed,
        report.iterations_per_size,
        if report.parallel { "parallel" } else { "sequential" },
        if report.estimate_clipping { "on" } else { "off" },
    );
    let _ = writeln!(out);

    for r in &report.results {
        let s = &r.stats;
        let _ = writeln!(out, "Sample size N = {}", s.sample_size);
        let _ = writeln!(
            out,
            "  Trials:            {} ({} recovered, {} degenerate, {:.2}%)",
            s.trials,
            s.recovered,
            s.degenerate,
            s.degenerate_fraction * 100.0
        );
        let _ = writeln!(out, "  Average bias v:    {:.6}", s.mean_bias.v);
        let _ = writeln!(out, "  Average bias a:    {:.6}", s.mean_bias.a);
        let _ = writeln!(out, "  Average bias t:    {:.6}", s.mean_bias.t);
        let _ = writeln!(out, "  Average sq. error: {:.6}", s.mean_squared_error);
        let by = &s.mean_squared_error_by_parameter;
        let _ = writeln!(
            out,
            "  MSE by parameter:  v={:.6}  a={:.6}  t={:.6}",
            by.v, by.a, by.t
        );
        let d = &s.diagnostics;
        let _ = writeln!(
            out,
            "  Guards fired:      R clipped {}, root floored {}, drift clamped {}, t floored {}, V fallback {}, estimate clipped {}",
            d.probability_clipped,
            d.root_floored,
            d.drift_clamped,
            d.nondecision_floored,
            d.variance_fallbacks,
            d.estimates_clipped
        );
        if s.untrustworthy {
            let _ = writeln!(
                out,
                "  WARNING: degenerate fraction too high, aggregates are not trustworthy"
            );
        }
        let _ = writeln!(out);
    }
    out
}

/// Per-trial CSV table for one sample size.
pub fn render_trials_csv(r: &SampleSizeReport) -> String {
    let mut out = String::with_capacity(64 + r.trials.len() * 160);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for t in &r.trials {
        let d = &t.diagnostics;
        let _ = writeln!(
            out,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{},{},{},{},{},{},{}",
            t.iteration,
            t.truth.v,
            t.truth.a,
            t.truth.t,
            t.estimated.v,
            t.estimated.a,
            t.estimated.t,
            t.bias.v,
            t.bias.a,
            t.bias.t,
            t.squared_error,
            t.degenerate
                .as_ref()
                .map(|r| r.to_string().replace(',', ";"))
                .unwrap_or_default(),
            d.inverse.probability_clipped as u8,
            d.inverse.root_floored as u8,
            d.inverse.drift_clamped as u8,
            d.inverse.nondecision_floored as u8,
            d.variance_fallback as u8,
            d.estimate_clipped as u8,
        );
    }
    out
}

/// Write summary.txt, summary.json and one CSV per sample size into `dir`.
/// Returns the paths written.
pub fn save_report(report: &ExperimentReport, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .map_err(|e| RecoveryError::io(format!("creating {}", dir.display()), e))?;

    let mut written = Vec::new();

    let summary_path = dir.join("summary.txt");
    write_file(&summary_path, render_summary(report))?;
    written.push(summary_path);

    let json_path = dir.join("summary.json");
    write_file(&json_path, serde_json::to_string_pretty(report)?)?;
    written.push(json_path);

    for r in &report.results {
        let path = dir.join(format!("results_N{}.csv", r.stats.sample_size));
        write_file(&path, render_trials_csv(r))?;
        written.push(path);
    }

    tracing::info!(dir = %dir.display(), files = written.len(), "report written");
    Ok(written)
}

fn write_file(path: &Path, contents: String) -> Result<()> {
    std::fs::write(path, contents)
        .map_err(|e| RecoveryError::io(format!("writing {}", path.display()), e))
}
