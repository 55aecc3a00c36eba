//! kvload binary: run one load test end to end and print the report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use kvload::{
    FIXTURE_PATH, RunConfig, RunContext, Supervisor, aggregate, build_fixture, load_keys,
    write_fixture,
};

#[derive(Parser, Debug)]
#[command(name = "kvload", about = "Load-test harness for a key-value service")]
struct Args {
    /// Service port
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Number of requests each worker sends
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    num_requests: u32,

    /// Period between requests, in microseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    request_period: u64,

    /// Number of workers to run concurrently
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    num_clients: u32,

    /// Path to the key file, one key per line
    #[arg(long)]
    key_file: PathBuf,

    /// Host workers connect to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Service executable under test
    #[arg(long, default_value = kvload::config::DEFAULT_SERVER_BIN)]
    server_bin: PathBuf,

    /// Worker executable
    #[arg(long, default_value = kvload::config::DEFAULT_WORKER_BIN)]
    worker_bin: PathBuf,

    /// Directory for worker summary artifacts (cleared at run start)
    #[arg(long, default_value = kvload::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::new(
            self.port,
            self.num_requests,
            self.request_period,
            self.num_clients,
            self.key_file,
        );
        config.host = self.host;
        config.server_bin = self.server_bin;
        config.worker_bin = self.worker_bin;
        config.output_dir = self.output_dir;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Respects RUST_LOG for filtering.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = args.into_config();
    config.validate()?;

    // Fixture first: the service loads it at its own startup.
    let keys = load_keys(&config.key_file)?;
    let fixture = build_fixture(&keys);
    write_fixture(&fixture, FIXTURE_PATH).context("write fixture for the service")?;

    // The run owns its output directory; clear it before any worker spawns.
    let ctx = RunContext::new(&config.output_dir);
    ctx.reset().context("reset run output directory")?;

    let mut supervisor = Supervisor::launch(&config, &ctx).await?;
    supervisor.join_workers().await?;
    supervisor.stop_service().await?;

    let totals = aggregate(&ctx)?;
    if (totals.artifacts as u32) < config.num_clients {
        // A worker that crashed before writing its artifact looks identical
        // to one that performed zero operations of every kind; surface the
        // shortfall instead of under-counting silently.
        warn!(
            expected = config.num_clients,
            found = totals.artifacts,
            "fewer summaries than workers; some workers left no artifact"
        );
    }
    info!(artifacts = totals.artifacts, "aggregation complete");

    println!("{}", totals.render());
    Ok(())
}
