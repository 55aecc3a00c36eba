//! Immutable parameters for one test run.

use std::path::PathBuf;

use crate::context::DEFAULT_OUTPUT_DIR;
use crate::error::{HarnessError, Result};

/// Default service executable, resolved from the working directory.
pub const DEFAULT_SERVER_BIN: &str = "./dictionary_server_main";

/// Default worker executable, resolved from the working directory.
pub const DEFAULT_WORKER_BIN: &str = "./dictionary_load_client";

/// Parameters for a single run. Built once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Port the service binds and workers connect to.
    pub port: u16,
    /// Requests each worker issues before exiting.
    pub num_requests: u32,
    /// Inter-request period per worker, in microseconds.
    pub request_period_us: u64,
    /// Number of concurrently executing worker processes.
    pub num_clients: u32,
    /// Path to the key list (one key per line).
    pub key_file: PathBuf,
    /// Host workers connect to.
    pub host: String,
    /// Service executable under test.
    pub server_bin: PathBuf,
    /// Worker executable.
    pub worker_bin: PathBuf,
    /// Directory the run owns for worker summary artifacts.
    pub output_dir: PathBuf,
}

impl RunConfig {
    pub fn new(
        port: u16,
        num_requests: u32,
        request_period_us: u64,
        num_clients: u32,
        key_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            port,
            num_requests,
            request_period_us,
            num_clients,
            key_file: key_file.into(),
            host: "127.0.0.1".to_string(),
            server_bin: PathBuf::from(DEFAULT_SERVER_BIN),
            worker_bin: PathBuf::from(DEFAULT_WORKER_BIN),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Type/range validation only: every numeric field must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(HarnessError::invalid_config("port must be positive"));
        }
        if self.num_requests == 0 {
            return Err(HarnessError::invalid_config(
                "num_requests must be positive",
            ));
        }
        if self.request_period_us == 0 {
            return Err(HarnessError::invalid_config(
                "request_period_us must be positive",
            ));
        }
        if self.num_clients == 0 {
            return Err(HarnessError::invalid_config("num_clients must be positive"));
        }
        if self.host.is_empty() {
            return Err(HarnessError::invalid_config("host must not be empty"));
        }
        Ok(())
    }
}
