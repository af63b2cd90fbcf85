//! Runners and the processes that host them.
//!
//! A [`Runner`] is a unit of work that becomes ready once and then runs until
//! it exits on its own or is told to stop through its [`Signals`]. Handing a
//! runner to [`Process::background`] spawns it on the tokio runtime and
//! returns a cloneable handle that can await readiness or exit and deliver
//! signals.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::error::RunError;
use crate::signal::Signal;

/// Result of a finished process. Shared between every handle that waits on it.
pub type Outcome = Result<(), Arc<RunError>>;

/// Behaviour hosted by a [`Process`].
#[async_trait]
pub trait Runner: Send + 'static {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Run until exit. Call `ready.signal()` once startup has completed.
    async fn run(self: Box<Self>, signals: Signals, ready: Ready) -> Result<(), RunError>;
}

#[derive(Debug, Clone)]
enum State {
    Starting,
    Ready,
    Exited { outcome: Outcome, was_ready: bool },
}

/// Incoming signals for a runner.
pub struct Signals {
    rx: mpsc::UnboundedReceiver<Signal>,
}

impl Signals {
    /// Wait for the next signal.
    ///
    /// Never resolves once every process handle has been dropped.
    pub async fn recv(&mut self) -> Signal {
        match self.rx.recv().await {
            Some(signal) => signal,
            None => std::future::pending().await,
        }
    }

    /// Take a pending signal without waiting.
    pub fn try_recv(&mut self) -> Option<Signal> {
        self.rx.try_recv().ok()
    }
}

/// One-shot readiness notifier handed to a runner.
pub struct Ready {
    state: Arc<watch::Sender<State>>,
}

impl Ready {
    /// Mark the process as ready.
    pub fn signal(self) {
        self.state.send_if_modified(|state| {
            if matches!(state, State::Starting) {
                *state = State::Ready;
                true
            } else {
                false
            }
        });
    }
}

/// Handle to a runner executing in the background.
#[derive(Clone)]
pub struct Process {
    name: Arc<str>,
    signals: mpsc::UnboundedSender<Signal>,
    state: watch::Receiver<State>,
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Process {
    /// Start a runner in the background under its own name.
    pub fn background(runner: Box<dyn Runner>) -> Self {
        let name: Arc<str> = Arc::from(runner.name());
        Self::spawn(name, runner)
    }

    /// Start a runner in the background under a different name.
    pub fn named(name: impl Into<String>, runner: Box<dyn Runner>) -> Self {
        let name: String = name.into();
        Self::spawn(Arc::from(name), runner)
    }

    fn spawn(name: Arc<str>, runner: Box<dyn Runner>) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(State::Starting);
        let state_tx = Arc::new(state_tx);

        let signals = Signals { rx: signal_rx };
        let ready = Ready {
            state: Arc::clone(&state_tx),
        };

        let run = tokio::spawn(runner.run(signals, ready));
        let task_name = Arc::clone(&name);

        tokio::spawn(async move {
            let outcome = match run.await {
                Ok(result) => result.map_err(Arc::new),
                Err(join_err) => Err(Arc::new(RunError::Panicked {
                    name: task_name.to_string(),
                    detail: join_err.to_string(),
                })),
            };

            match &outcome {
                Ok(()) => debug!(process = %task_name, "process exited"),
                Err(e) => debug!(process = %task_name, error = %e, "process exited with error"),
            }

            state_tx.send_modify(move |state| {
                let was_ready = matches!(state, State::Ready);
                *state = State::Exited { outcome, was_ready };
            });
        });

        Self {
            name,
            signals: signal_tx,
            state: state_rx,
        }
    }

    /// Process name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deliver a signal. Signals to exited processes are dropped.
    pub fn signal(&self, signal: Signal) {
        let _ = self.signals.send(signal);
    }

    /// Wait until the process is ready.
    ///
    /// Fails if the process exits without ever becoming ready.
    pub async fn ready(&self) -> Result<(), RunError> {
        let mut state = self.state.clone();
        let observed = match state.wait_for(|s| !matches!(s, State::Starting)).await {
            Ok(observed) => observed.clone(),
            Err(_) => {
                return Err(RunError::Panicked {
                    name: self.name.to_string(),
                    detail: "process task vanished".to_string(),
                })
            }
        };

        match observed {
            State::Ready | State::Exited { was_ready: true, .. } => Ok(()),
            State::Exited { outcome, .. } => Err(RunError::ExitedBeforeReady {
                name: self.name.to_string(),
                cause: match outcome {
                    Ok(()) => "exited cleanly".to_string(),
                    Err(e) => e.to_string(),
                },
            }),
            State::Starting => Err(RunError::failed(format!(
                "{}: readiness wait returned while starting",
                self.name
            ))),
        }
    }

    /// Wait until the process exits.
    pub async fn wait(&self) -> Outcome {
        let mut state = self.state.clone();
        let result = state
            .wait_for(|s| matches!(s, State::Exited { .. }))
            .await
            .map(|observed| observed.clone());

        match result {
            Ok(State::Exited { outcome, .. }) => outcome,
            _ => Err(Arc::new(RunError::Panicked {
                name: self.name.to_string(),
                detail: "process task vanished".to_string(),
            })),
        }
    }

    /// Whether the process has become ready (and possibly exited since).
    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.borrow(),
            State::Ready | State::Exited { was_ready: true, .. }
        )
    }

    /// Whether the process has exited.
    pub fn has_exited(&self) -> bool {
        matches!(*self.state.borrow(), State::Exited { .. })
    }

    /// Outcome of the process if it has exited.
    pub fn outcome(&self) -> Option<Outcome> {
        match &*self.state.borrow() {
            State::Exited { outcome, .. } => Some(outcome.clone()),
            _ => None,
        }
    }
}

/// Runner backed by an async closure.
pub struct FnRunner<F> {
    name: String,
    f: F,
}

impl<F, Fut> FnRunner<F>
where
    F: FnOnce(Signals, Ready) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), RunError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Box the runner for use with [`Process::background`].
    pub fn boxed(self) -> Box<dyn Runner> {
        Box::new(self)
    }
}

#[async_trait]
impl<F, Fut> Runner for FnRunner<F>
where
    F: FnOnce(Signals, Ready) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), RunError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, signals: Signals, ready: Ready) -> Result<(), RunError> {
        (self.f)(signals, ready).await
    }
}
