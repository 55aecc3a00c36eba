//! Run context: the output directory one run owns.
//!
//! The directory is an explicit object passed to both the spawn phase and
//! the aggregation phase. Resetting it before any worker spawns is an
//! invariant of the harness, so the reset is a named operation here rather
//! than a side effect buried in orchestration code.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Default relative location for worker summary artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "test_res";

/// The output directory owned by the current run.
#[derive(Debug, Clone)]
pub struct RunContext {
    output_dir: PathBuf,
}

impl RunContext {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Clear the output directory so no summaries from a prior run leak
    /// into the current aggregation. Must run before any worker spawns.
    pub fn reset(&self) -> Result<()> {
        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir)?;
        }
        fs::create_dir_all(&self.output_dir)?;
        debug!(dir = %self.output_dir.display(), "output directory reset");
        Ok(())
    }

    /// Artifact path handed to worker `index`. One path per worker, so
    /// workers never contend on a file.
    pub fn worker_artifact(&self, index: u32) -> PathBuf {
        self.output_dir.join(format!("client_{index}.json"))
    }
}
