//! Start/stop helpers over [`Process`].

use std::time::Duration;

use tracing::{info, warn};

use crate::error::RunError;
use crate::process::{Process, Runner};
use crate::signal::Signal;

/// How long teardown helpers wait for a process to exit after a signal.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(20);

/// Start a runner and wait until it is ready.
///
/// If the runner fails to become ready it is killed and the startup error is
/// returned.
pub async fn invoke(runner: Box<dyn Runner>) -> Result<Process, RunError> {
    let process = Process::background(runner);
    info!(process = %process.name(), "invoking");

    match process.ready().await {
        Ok(()) => {
            info!(process = %process.name(), "ready");
            Ok(process)
        }
        Err(e) => {
            process.signal(Signal::Kill);
            let _ = tokio::time::timeout(DEFAULT_STOP_TIMEOUT, process.wait()).await;
            Err(e)
        }
    }
}

/// Send SIGINT and wait for the process to exit.
pub async fn interrupt(process: &Process, timeout: Duration) -> Result<(), RunError> {
    stop_with(process, Signal::Interrupt, timeout).await
}

/// Send SIGKILL and wait for the process to exit.
pub async fn kill(process: &Process, timeout: Duration) -> Result<(), RunError> {
    stop_with(process, Signal::Kill, timeout).await
}

/// Deliver `signal` and wait up to `timeout` for the process to exit.
///
/// The exit outcome itself is not inspected: a process that exits because it
/// was told to is considered stopped.
pub async fn stop_with(process: &Process, signal: Signal, timeout: Duration) -> Result<(), RunError> {
    info!(process = %process.name(), %signal, "stopping");
    process.signal(signal);

    match tokio::time::timeout(timeout, process.wait()).await {
        Ok(_) => Ok(()),
        Err(_) => Err(RunError::ShutdownTimeout {
            name: process.name().to_string(),
            signal,
            timeout,
        }),
    }
}

/// Kill every present process, then wait for each of them.
///
/// Absent entries are skipped so callers can pass processes that were never
/// started.
pub async fn stop_processes<'a, I>(processes: I) -> Result<(), RunError>
where
    I: IntoIterator<Item = Option<&'a Process>>,
{
    let processes: Vec<&Process> = processes.into_iter().flatten().collect();

    for process in &processes {
        process.signal(Signal::Kill);
    }

    let mut stuck = Vec::new();
    for process in &processes {
        if tokio::time::timeout(DEFAULT_STOP_TIMEOUT, process.wait())
            .await
            .is_err()
        {
            warn!(process = %process.name(), "process did not exit after SIGKILL");
            stuck.push(process.name().to_string());
        }
    }

    if stuck.is_empty() {
        Ok(())
    } else {
        Err(RunError::StopFailed {
            count: stuck.len(),
            summary: stuck.join(", "),
        })
    }
}
