//! Per-worker summary artifacts.
//!
//! Each worker writes exactly one JSON record on completion. A kind the
//! worker never performed is absent entirely; absence is not a zero count.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Operation kinds a worker reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Read,
    Write,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Read => write!(f, "read"),
            OpKind::Write => write!(f, "write"),
        }
    }
}

/// Sample count and local mean latency for one operation kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KindStats {
    /// Number of samples the worker took. Positive by contract.
    pub n_samples: u64,
    /// Arithmetic mean latency over those samples, in microseconds.
    pub mean: f64,
}

/// One worker's statistics record. Either kind may be absent, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<KindStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<KindStats>,
}

impl WorkerSummary {
    pub fn kind(&self, kind: OpKind) -> Option<&KindStats> {
        match kind {
            OpKind::Read => self.read.as_ref(),
            OpKind::Write => self.write.as_ref(),
        }
    }

    /// Parse and validate an artifact. Malformed content is a hard failure
    /// naming the offending path; the aggregator never skips corrupt data.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let summary: WorkerSummary = serde_json::from_str(&raw)
            .map_err(|err| HarnessError::summary_parse(path, err.to_string()))?;
        summary
            .check_contract()
            .map_err(|reason| HarnessError::summary_parse(path, reason))?;
        Ok(summary)
    }

    fn check_contract(&self) -> std::result::Result<(), String> {
        if self.read.is_none() && self.write.is_none() {
            return Err("neither \"read\" nor \"write\" is present".to_string());
        }
        for kind in [OpKind::Read, OpKind::Write] {
            if let Some(stats) = self.kind(kind) {
                if stats.n_samples == 0 {
                    return Err(format!("{kind} entry has zero n_samples"));
                }
                if !stats.mean.is_finite() || stats.mean < 0.0 {
                    return Err(format!("{kind} entry has invalid mean {}", stats.mean));
                }
            }
        }
        Ok(())
    }
}
