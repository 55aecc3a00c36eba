//! Process supervision for one run: the service under test plus N workers.
//!
//! The supervisor owns the full lifecycle: service first, then all workers,
//! then a join-all-workers barrier, and only after every worker has exited
//! an interrupt-style stop of the service. Its control flow is
//! single-threaded and suspends only on child exits.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::context::RunContext;
use crate::error::{HarnessError, Result};

const READY_PROBE_ATTEMPTS: u32 = 5;
const READY_PROBE_INITIAL_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug)]
struct WorkerHandle {
    index: u32,
    child: Child,
}

#[derive(Debug)]
pub struct Supervisor {
    service: Child,
    workers: Vec<WorkerHandle>,
}

impl Supervisor {
    /// Spawn the service, then all workers. The service is fully started
    /// (spawned) before any worker; worker spawn order is not otherwise
    /// synchronized. A launch failure aborts the run, tearing the service
    /// back down rather than leaving it orphaned.
    pub async fn launch(config: &RunConfig, ctx: &RunContext) -> Result<Self> {
        let mut service = spawn_service(config)?;
        info!(
            pid = service.id(),
            port = config.port,
            bin = %config.server_bin.display(),
            "service spawned"
        );

        probe_service(&config.host, config.port).await;

        let mut workers = Vec::with_capacity(config.num_clients as usize);
        for index in 0..config.num_clients {
            match spawn_worker(config, ctx, index) {
                Ok(child) => {
                    debug!(worker = index, pid = child.id(), "worker spawned");
                    workers.push(WorkerHandle { index, child });
                }
                Err(err) => {
                    teardown(service, workers).await;
                    return Err(err);
                }
            }
        }
        info!(count = workers.len(), "all workers spawned");

        Ok(Self { service, workers })
    }

    /// Join-all rendezvous: await every worker's exit, in any order, before
    /// returning. Exit status is logged but never treated as a fault; a
    /// failed worker simply leaves no well-formed artifact behind.
    pub async fn join_workers(&mut self) -> Result<()> {
        for handle in &mut self.workers {
            let status = handle.child.wait().await?;
            if status.success() {
                debug!(worker = handle.index, "worker exited");
            } else {
                warn!(worker = handle.index, %status, "worker exited non-zero");
            }
        }
        info!(count = self.workers.len(), "all workers exited");
        Ok(())
    }

    /// Request graceful termination (SIGINT, not a kill) and await exit.
    /// Must only run after [`Self::join_workers`] has returned.
    pub async fn stop_service(&mut self) -> Result<ExitStatus> {
        if let Some(pid) = self.service.id() {
            signal::kill(Pid::from_raw(pid as i32), Signal::SIGINT)
                .map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))?;
            debug!(pid, "interrupt sent to service");
        }
        let status = self.service.wait().await?;
        info!(%status, "service exited");
        Ok(status)
    }
}

fn spawn_service(config: &RunConfig) -> Result<Child> {
    Command::new(&config.server_bin)
        .arg(config.port.to_string())
        .spawn()
        .map_err(|source| {
            HarnessError::launch(format!("service {}", config.server_bin.display()), source)
        })
}

fn spawn_worker(config: &RunConfig, ctx: &RunContext, index: u32) -> Result<Child> {
    Command::new(&config.worker_bin)
        .arg(&config.host)
        .arg(config.port.to_string())
        .arg(config.num_requests.to_string())
        .arg(config.request_period_us.to_string())
        .arg(&config.key_file)
        .arg(ctx.worker_artifact(index))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| {
            HarnessError::launch(
                format!("worker {} {index}", config.worker_bin.display()),
                source,
            )
        })
}

/// Kill and reap every child spawned by an aborted launch. Awaiting the
/// kill reaps each process; an unawaited kill would leave zombies behind
/// for the rest of the harness's lifetime.
async fn teardown(mut service: Child, workers: Vec<WorkerHandle>) {
    let _ = service.kill().await;
    for mut handle in workers {
        let _ = handle.child.kill().await;
    }
}

/// Best-effort readiness probe: retry a TCP connect with backoff before the
/// workers spawn. The harness has no readiness protocol with the service,
/// so exhausting the attempts only logs a warning and proceeds. Returns
/// whether a connection ever succeeded.
async fn probe_service(host: &str, port: u16) -> bool {
    let addr = format!("{host}:{port}");
    let mut delay = READY_PROBE_INITIAL_DELAY;
    for attempt in 1..=READY_PROBE_ATTEMPTS {
        if TcpStream::connect(&addr).await.is_ok() {
            debug!(%addr, attempt, "service accepting connections");
            return true;
        }
        // No point sleeping out the backoff once the last attempt failed.
        if attempt < READY_PROBE_ATTEMPTS {
            sleep(delay).await;
            delay = (delay * 2).min(Duration::from_millis(500));
        }
    }
    warn!(%addr, "service never accepted a connection; proceeding anyway");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_succeeds_against_a_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let start = Instant::now();
        assert!(probe_service("127.0.0.1", port).await);
        assert!(
            start.elapsed() < Duration::from_millis(100),
            "probe slept despite a listening service"
        );
    }

    #[tokio::test]
    async fn test_probe_gives_up_without_trailing_backoff_sleep() {
        // Bind then drop to get a loopback port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let start = Instant::now();
        assert!(!probe_service("127.0.0.1", port).await);
        let elapsed = start.elapsed();
        // Backoff sleeps between attempts sum to 300ms; a sleep after the
        // final attempt would push the floor past 600ms.
        assert!(
            elapsed < Duration::from_millis(600),
            "probe waited {elapsed:?} before giving up"
        );
    }

    #[tokio::test]
    async fn test_aborted_launch_reaps_spawned_children() {
        let service = Command::new("sleep").arg("5").spawn().expect("spawn service stand-in");
        let service_pid = service.id().expect("service pid") as i32;
        let worker = Command::new("sleep").arg("5").spawn().expect("spawn worker stand-in");
        let worker_pid = worker.id().expect("worker pid") as i32;

        teardown(
            service,
            vec![WorkerHandle {
                index: 0,
                child: worker,
            }],
        )
        .await;

        // Signal 0 probes for existence; a zombie left unreaped would
        // still answer.
        for pid in [service_pid, worker_pid] {
            assert!(
                signal::kill(Pid::from_raw(pid), None).is_err(),
                "process {pid} was not reaped"
            );
        }
    }
}
