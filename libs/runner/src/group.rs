//! Process groups.
//!
//! Groups are runners themselves, so an ordered group can contain a parallel
//! group and vice versa:
//!
//! ```text
//! Ordered("plumbing")
//! └── Parallel("dependencies")
//!     ├── nats
//!     ├── sql
//!     ├── consul
//!     └── ...
//! ```
//!
//! A group is ready once every member is ready. If any member exits while
//! the group is running, the remaining members are stopped with the group's
//! termination signal and the group fails naming that member.

use async_trait::async_trait;
use futures_util::future::{join_all, select_all, try_join_all};
use tracing::{info, warn};

use crate::error::RunError;
use crate::lifecycle::{stop_with, DEFAULT_STOP_TIMEOUT};
use crate::process::{Outcome, Process, Ready, Runner, Signals};
use crate::signal::Signal;

/// A named member of a group.
pub struct Member {
    pub name: String,
    pub runner: Box<dyn Runner>,
}

impl Member {
    pub fn new(name: impl Into<String>, runner: Box<dyn Runner>) -> Self {
        Self {
            name: name.into(),
            runner,
        }
    }
}

/// Starts members one after another; stops them in reverse.
pub struct Ordered {
    name: String,
    termination: Signal,
    members: Vec<Member>,
}

impl Ordered {
    pub fn new(name: impl Into<String>, termination: Signal, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            termination,
            members,
        }
    }
}

#[async_trait]
impl Runner for Ordered {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, mut signals: Signals, ready: Ready) -> Result<(), RunError> {
        let mut started: Vec<Process> = Vec::with_capacity(self.members.len());

        for member in self.members {
            let process = Process::named(member.name, member.runner);

            tokio::select! {
                result = process.ready() => {
                    if let Err(e) = result {
                        stop_in_reverse(&started, self.termination).await;
                        return Err(RunError::MemberExited {
                            member: process.name().to_string(),
                            cause: e.to_string(),
                        });
                    }
                }
                signal = signals.recv() => {
                    started.push(process);
                    stop_in_reverse(&started, signal).await;
                    return Ok(());
                }
            }

            info!(group = %self.name, member = %process.name(), "member ready");
            started.push(process);
        }

        ready.signal();

        tokio::select! {
            signal = signals.recv() => {
                stop_in_reverse(&started, signal).await;
                Ok(())
            }
            (index, outcome) = first_exit(&started) => {
                let member = started.remove(index);
                stop_in_reverse(&started, self.termination).await;
                Err(member_exited(&member, &outcome))
            }
        }
    }
}

/// Starts all members at once; stops them all at once.
pub struct Parallel {
    name: String,
    termination: Signal,
    members: Vec<Member>,
}

impl Parallel {
    pub fn new(name: impl Into<String>, termination: Signal, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            termination,
            members,
        }
    }
}

#[async_trait]
impl Runner for Parallel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, mut signals: Signals, ready: Ready) -> Result<(), RunError> {
        let mut processes: Vec<Process> = self
            .members
            .into_iter()
            .map(|member| Process::named(member.name, member.runner))
            .collect();

        let all_ready = try_join_all(processes.iter().map(|process| async move {
            process
                .ready()
                .await
                .map_err(|e| (process.name().to_string(), e))
        }));

        tokio::select! {
            result = all_ready => {
                if let Err((member, e)) = result {
                    stop_all(&processes, self.termination).await;
                    return Err(RunError::MemberExited {
                        member,
                        cause: e.to_string(),
                    });
                }
            }
            signal = signals.recv() => {
                stop_all(&processes, signal).await;
                return Ok(());
            }
        }

        info!(group = %self.name, members = processes.len(), "all members ready");
        ready.signal();

        tokio::select! {
            signal = signals.recv() => {
                stop_all(&processes, signal).await;
                Ok(())
            }
            (index, outcome) = first_exit(&processes) => {
                let member = processes.remove(index);
                stop_all(&processes, self.termination).await;
                Err(member_exited(&member, &outcome))
            }
        }
    }
}

async fn first_exit(processes: &[Process]) -> (usize, Outcome) {
    if processes.is_empty() {
        return std::future::pending().await;
    }

    let waits = processes.iter().map(|process| Box::pin(process.wait()));
    let (outcome, index, _) = select_all(waits).await;
    (index, outcome)
}

fn member_exited(member: &Process, outcome: &Outcome) -> RunError {
    RunError::MemberExited {
        member: member.name().to_string(),
        cause: match outcome {
            Ok(()) => "exited cleanly".to_string(),
            Err(e) => e.to_string(),
        },
    }
}

async fn stop_in_reverse(processes: &[Process], signal: Signal) {
    for process in processes.iter().rev() {
        if let Err(e) = stop_with(process, signal, DEFAULT_STOP_TIMEOUT).await {
            warn!(process = %process.name(), error = %e, "group member did not stop");
        }
    }
}

async fn stop_all(processes: &[Process], signal: Signal) {
    let stops = processes
        .iter()
        .map(|process| async move { (process, stop_with(process, signal, DEFAULT_STOP_TIMEOUT).await) });

    for (process, result) in join_all(stops).await {
        if let Err(e) = result {
            warn!(process = %process.name(), error = %e, "group member did not stop");
        }
    }
}
