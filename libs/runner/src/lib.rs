//! Process supervision for multi-component test deployments.
//!
//! ## Overview
//!
//! - [`Runner`]: something that starts, becomes ready and runs until told to stop
//! - [`Process`]: handle to a runner running in the background
//! - [`Ordered`] / [`Parallel`]: groups of runners started in sequence or all at once
//! - [`CommandRunner`]: supervises an OS process, readiness keyed on its output
//! - [`invoke`], [`interrupt`], [`stop_processes`]: lifecycle helpers used by scenarios

pub mod command;
pub mod error;
pub mod group;
pub mod lifecycle;
pub mod process;
pub mod signal;

pub use command::{CommandRunner, CommandSpec, ComponentLog, DEFAULT_START_TIMEOUT};
pub use error::RunError;
pub use group::{Member, Ordered, Parallel};
pub use lifecycle::{interrupt, invoke, kill, stop_processes, stop_with, DEFAULT_STOP_TIMEOUT};
pub use process::{FnRunner, Outcome, Process, Ready, Runner, Signals};
pub use signal::Signal;
