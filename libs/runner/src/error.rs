//! Error types for process supervision.

use std::time::Duration;

use thiserror::Error;

use crate::signal::Signal;

/// Errors raised while starting, running or stopping a supervised process.
#[derive(Debug, Error)]
pub enum RunError {
    /// The executable could not be spawned.
    #[error("{name}: failed to spawn {program}: {source}")]
    Spawn {
        name: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The start check did not pass in time.
    #[error("{name}: did not become ready within {timeout:?}")]
    StartTimeout { name: String, timeout: Duration },

    /// The process exited while still starting.
    #[error("{name}: exited before becoming ready ({cause})")]
    ExitedBeforeReady { name: String, cause: String },

    /// The process exited on its own with a failing status.
    #[error("{name}: exited with {status}")]
    ExitStatus { name: String, status: String },

    /// The process ignored a stop signal.
    #[error("{name}: still running {timeout:?} after {signal}")]
    ShutdownTimeout {
        name: String,
        signal: Signal,
        timeout: Duration,
    },

    /// The runner task panicked.
    #[error("{name}: panicked: {detail}")]
    Panicked { name: String, detail: String },

    /// A member of a process group exited and brought the group down.
    #[error("group member {member} exited: {cause}")]
    MemberExited { member: String, cause: String },

    /// Some processes could not be stopped.
    #[error("failed to stop {count} process(es): {summary}")]
    StopFailed { count: usize, summary: String },

    /// A runner reported a failure of its own.
    #[error("{0}")]
    Failed(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Convenience constructor for runner-specific failures.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
