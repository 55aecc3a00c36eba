//! Result aggregation: weighted merge of per-worker summaries.
//!
//! The aggregator never sees raw samples, only each worker's local mean and
//! count. Keeping exact sum/count accumulators and dividing once at the end
//! makes `Σ(mean_i * n_i) / Σn_i` numerically equal to the mean over the
//! union of all raw samples, which a running mean-of-means would not be.

use std::fs;

use tracing::{debug, warn};

use crate::context::RunContext;
use crate::error::{HarnessError, Result};
use crate::summary::{KindStats, OpKind, WorkerSummary};

/// Exact accumulators for one operation kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindTotals {
    samples: u64,
    total_us: f64,
}

impl KindTotals {
    pub fn absorb(&mut self, stats: &KindStats) {
        self.samples += stats.n_samples;
        self.total_us += stats.mean * stats.n_samples as f64;
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Weighted mean in microseconds, or `NoSamples` when nothing of this
    /// kind was reported. Never divides by zero silently.
    pub fn mean_us(&self, kind: OpKind) -> Result<f64> {
        if self.samples == 0 {
            return Err(HarnessError::NoSamples { kind });
        }
        Ok(self.total_us / self.samples as f64)
    }
}

/// Global totals across every worker summary in the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    pub read: KindTotals,
    pub write: KindTotals,
    /// Number of well-formed artifacts consumed.
    pub artifacts: usize,
}

impl RunTotals {
    pub fn absorb(&mut self, summary: &WorkerSummary) {
        if let Some(stats) = &summary.read {
            self.read.absorb(stats);
        }
        if let Some(stats) = &summary.write {
            self.write.absorb(stats);
        }
        self.artifacts += 1;
    }

    fn kind_line(&self, label: &str, totals: &KindTotals, kind: OpKind) -> String {
        match totals.mean_us(kind) {
            Ok(mean) => format!("{label} mean: {mean:.3} us ({} samples)", totals.samples()),
            Err(_) => format!("{label} mean: no data (0 samples)"),
        }
    }

    /// The two human-readable report lines. A kind nobody reported renders
    /// as `no data` instead of aborting, so a read-only run still reports
    /// its reads.
    pub fn render(&self) -> String {
        let read = self.kind_line("Read", &self.read, OpKind::Read);
        let write = self.kind_line("Write", &self.write, OpKind::Write);
        format!("{read}\n{write}")
    }
}

/// Scan the run's output directory and merge every worker summary found.
///
/// Files that do not match the `*.json` artifact naming are ignored
/// (forward-compatible with future metadata files); a `.json` file that is
/// not a well-formed summary fails the whole aggregation.
pub fn aggregate(ctx: &RunContext) -> Result<RunTotals> {
    let mut totals = RunTotals::default();
    for entry in fs::read_dir(ctx.output_dir())? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            debug!(path = %path.display(), "skipping non-summary file");
            continue;
        }
        let summary = WorkerSummary::load(&path)?;
        totals.absorb(&summary);
    }
    if totals.artifacts == 0 {
        warn!(
            dir = %ctx.output_dir().display(),
            "no worker summaries found in output directory"
        );
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context_with(artifacts: &[&str]) -> (TempDir, RunContext) {
        let dir = TempDir::new().expect("tempdir");
        let ctx = RunContext::new(dir.path());
        for (index, contents) in artifacts.iter().enumerate() {
            fs::write(ctx.worker_artifact(index as u32), contents).expect("write artifact");
        }
        (dir, ctx)
    }

    #[test]
    fn test_uniform_workers_report_their_common_mean() {
        // Two workers, each {"read": 10 samples @ 100us} -> 100.0 over 20.
        let (_dir, ctx) = context_with(&[
            r#"{"read": {"n_samples": 10, "mean": 100.0}}"#,
            r#"{"read": {"n_samples": 10, "mean": 100.0}}"#,
        ]);
        let totals = aggregate(&ctx).expect("aggregate");
        assert_eq!(totals.read.samples(), 20);
        assert_eq!(totals.read.mean_us(OpKind::Read).expect("read mean"), 100.0);
        assert!(matches!(
            totals.write.mean_us(OpKind::Write),
            Err(HarnessError::NoSamples {
                kind: OpKind::Write
            })
        ));
    }

    #[test]
    fn test_weighted_mean_of_unequal_workers() {
        let (_dir, ctx) = context_with(&[
            r#"{"read": {"n_samples": 5, "mean": 200.0}}"#,
            r#"{"read": {"n_samples": 15, "mean": 100.0}}"#,
        ]);
        let totals = aggregate(&ctx).expect("aggregate");
        // (5*200 + 15*100) / 20
        assert_eq!(totals.read.mean_us(OpKind::Read).expect("read mean"), 125.0);
    }

    #[test]
    fn test_weighted_identity_matches_direct_mean_over_raw_samples() {
        // Per-worker raw sample sets; each worker reports only its local
        // arithmetic mean and count.
        let worker_samples: Vec<Vec<f64>> = vec![
            vec![100.0, 150.0, 200.0],
            vec![50.0, 60.0, 70.0, 80.0],
            vec![10.0],
        ];
        let mut totals = RunTotals::default();
        for samples in &worker_samples {
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            totals.absorb(&WorkerSummary {
                read: Some(KindStats {
                    n_samples: samples.len() as u64,
                    mean,
                }),
                write: None,
            });
        }

        let union: Vec<f64> = worker_samples.into_iter().flatten().collect();
        let direct = union.iter().sum::<f64>() / union.len() as f64;
        let merged = totals.read.mean_us(OpKind::Read).expect("read mean");
        assert!((merged - direct).abs() < 1e-9, "{merged} != {direct}");
    }

    #[test]
    fn test_absent_kind_is_not_a_zero_count() {
        let (_dir, ctx) = context_with(&[
            r#"{"read": {"n_samples": 4, "mean": 10.0}, "write": {"n_samples": 2, "mean": 30.0}}"#,
            r#"{"read": {"n_samples": 4, "mean": 20.0}}"#,
        ]);
        let totals = aggregate(&ctx).expect("aggregate");
        assert_eq!(totals.read.samples(), 8);
        assert_eq!(totals.write.samples(), 2);
        assert_eq!(
            totals.write.mean_us(OpKind::Write).expect("write mean"),
            30.0
        );
    }

    #[test]
    fn test_non_summary_files_are_ignored() {
        let (dir, ctx) = context_with(&[r#"{"read": {"n_samples": 1, "mean": 7.0}}"#]);
        fs::write(dir.path().join("run_metadata.txt"), "not a summary").expect("write");
        fs::write(dir.path().join("service.log"), "boot noise").expect("write");

        let totals = aggregate(&ctx).expect("aggregate");
        assert_eq!(totals.artifacts, 1);
        assert_eq!(totals.read.samples(), 1);
    }

    #[test]
    fn test_malformed_artifact_fails_aggregation_naming_the_path() {
        let (_dir, ctx) = context_with(&[
            r#"{"read": {"n_samples": 1, "mean": 7.0}}"#,
            "{{{ corrupt",
        ]);
        let err = aggregate(&ctx).expect_err("must fail");
        match err {
            HarnessError::SummaryParse { path, .. } => {
                assert!(path.to_string_lossy().contains("client_1.json"));
            }
            other => panic!("expected SummaryParse, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_directory_yields_no_samples_for_both_kinds() {
        let (_dir, ctx) = context_with(&[]);
        let totals = aggregate(&ctx).expect("aggregate");
        assert_eq!(totals.artifacts, 0);
        assert!(totals.read.mean_us(OpKind::Read).is_err());
        assert!(totals.write.mean_us(OpKind::Write).is_err());
    }

    #[test]
    fn test_render_reports_no_data_instead_of_dividing() {
        let (_dir, ctx) = context_with(&[
            r#"{"read": {"n_samples": 10, "mean": 100.0}}"#,
            r#"{"read": {"n_samples": 10, "mean": 100.0}}"#,
        ]);
        let totals = aggregate(&ctx).expect("aggregate");
        let rendered = totals.render();
        assert!(rendered.contains("Read mean: 100.000 us (20 samples)"));
        assert!(rendered.contains("Write mean: no data (0 samples)"));
    }
}
