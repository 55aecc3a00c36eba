//! kvload - load-test harness for a key-value service.
//!
//! The harness seeds the service with an identity fixture, launches the
//! service and a configurable number of out-of-process load workers, joins
//! every worker before signalling the service to stop, then merges the
//! per-worker latency summaries into one weighted global report.

pub mod config;
pub mod context;
pub mod error;
pub mod fixture;
pub mod report;
pub mod summary;
pub mod supervisor;

pub use config::RunConfig;
pub use context::{DEFAULT_OUTPUT_DIR, RunContext};
pub use error::{HarnessError, Result};
pub use fixture::{FIXTURE_PATH, Fixture, build_fixture, load_keys, write_fixture};
pub use report::{KindTotals, RunTotals, aggregate};
pub use summary::{KindStats, OpKind, WorkerSummary};
pub use supervisor::Supervisor;
