//! Error taxonomy for the harness.

use std::path::PathBuf;

use thiserror::Error;

use crate::summary::OpKind;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Failures a run can surface. Fixture and launch errors abort the run
/// before any partial work; the rest surface at aggregation time.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The key-list file could not be opened or read.
    #[error("failed to read key file {path}: {source}")]
    FixtureInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service or a worker executable could not be started.
    #[error("failed to launch {what}: {source}")]
    ProcessLaunch {
        what: String,
        #[source]
        source: std::io::Error,
    },

    /// A worker summary artifact exists but is not well-formed.
    #[error("summary artifact {path} is not well-formed: {reason}")]
    SummaryParse { path: PathBuf, reason: String },

    /// Aggregation was asked for a mean over zero samples of a kind.
    #[error("no {kind} samples recorded")]
    NoSamples { kind: OpKind },

    /// A run parameter failed validation.
    #[error("invalid run configuration: {message}")]
    InvalidConfig { message: String },

    /// I/O outside the typed cases above (artifact reads, directory reset,
    /// child process waits).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn launch(what: impl Into<String>, source: std::io::Error) -> Self {
        Self::ProcessLaunch {
            what: what.into(),
            source,
        }
    }

    pub fn summary_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SummaryParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = HarnessError::summary_parse("test_res/client_3.json", "missing field `mean`");
        assert!(err.to_string().contains("client_3.json"));
        assert!(err.to_string().contains("missing field"));

        let err = HarnessError::NoSamples {
            kind: OpKind::Write,
        };
        assert_eq!(err.to_string(), "no write samples recorded");
    }
}
