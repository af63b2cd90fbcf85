//! Runner that supervises an OS process.
//!
//! The child's stdout and stderr are read line by line. Every line goes to
//! the shared [`ComponentLog`] when one is attached, otherwise to the
//! tracing log at debug level. When a start marker is configured, the runner
//! becomes ready on the first line containing it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::RunError;
use crate::process::{Ready, Runner, Signals};
use crate::signal::Signal;

/// Default time allowed for a start marker to appear.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(10);

/// Append-only file that collects the output of every component.
#[derive(Clone)]
pub struct ComponentLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl ComponentLog {
    /// Create (or truncate) the log file.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, component: &str, stream: &str, line: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "[{component}] [{stream}] {line}");
        }
    }
}

/// Description of a process to supervise.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    /// Output substring that marks the process as started.
    pub started_when: Option<String>,
    pub start_timeout: Duration,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
            started_when: None,
            start_timeout: DEFAULT_START_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn started_when(mut self, marker: impl Into<String>) -> Self {
        self.started_when = Some(marker.into());
        self
    }

    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }
}

type Cleanup = Box<dyn FnOnce() + Send>;

/// Runner that spawns and supervises a [`CommandSpec`].
pub struct CommandRunner {
    spec: CommandSpec,
    log: Option<ComponentLog>,
    cleanup: Option<Cleanup>,
}

impl CommandRunner {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            log: None,
            cleanup: None,
        }
    }

    /// Send output to a component log instead of the tracing log.
    pub fn with_log(mut self, log: Option<ComponentLog>) -> Self {
        self.log = log;
        self
    }

    /// Run `cleanup` once the process has exited.
    pub fn with_cleanup(mut self, cleanup: impl FnOnce() + Send + 'static) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn boxed(self) -> Box<dyn Runner> {
        Box::new(self)
    }
}

enum Startup {
    Ready,
    Signalled(Signal),
    Exited(ExitStatus),
    TimedOut,
}

#[async_trait]
impl Runner for CommandRunner {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn run(self: Box<Self>, mut signals: Signals, ready: Ready) -> Result<(), RunError> {
        let CommandRunner { spec, log, cleanup } = *self;

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            name: spec.name.clone(),
            program: spec.program.display().to_string(),
            source,
        })?;
        let pid = child.id().map(|id| Pid::from_raw(id as i32));
        info!(component = %spec.name, pid = ?pid, program = %spec.program.display(), "spawned");

        let (marker_tx, mut marker_rx) = mpsc::channel::<()>(1);
        if let Some(stdout) = child.stdout.take() {
            pump_output(&spec, "stdout", stdout, log.clone(), marker_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            pump_output(&spec, "stderr", stderr, log.clone(), marker_tx.clone());
        }
        drop(marker_tx);

        let startup = if spec.started_when.is_none() {
            Startup::Ready
        } else {
            let deadline = tokio::time::sleep(spec.start_timeout);
            tokio::pin!(deadline);

            tokio::select! {
                Some(()) = marker_rx.recv() => Startup::Ready,
                status = child.wait() => Startup::Exited(status?),
                signal = signals.recv() => Startup::Signalled(signal),
                _ = &mut deadline => Startup::TimedOut,
            }
        };

        let result = match startup {
            Startup::Ready => {
                ready.signal();
                supervise(&spec, &mut child, pid, &mut signals).await
            }
            Startup::Signalled(signal) => {
                forward(&spec.name, pid, signal);
                child.wait().await?;
                Ok(())
            }
            Startup::Exited(status) => Err(RunError::ExitedBeforeReady {
                name: spec.name.clone(),
                cause: status.to_string(),
            }),
            Startup::TimedOut => {
                forward(&spec.name, pid, Signal::Kill);
                let _ = child.wait().await;
                Err(RunError::StartTimeout {
                    name: spec.name.clone(),
                    timeout: spec.start_timeout,
                })
            }
        };

        if let Some(cleanup) = cleanup {
            cleanup();
        }

        result
    }
}

/// Wait for exit, forwarding signals. Any exit after a forwarded signal is clean.
async fn supervise(
    spec: &CommandSpec,
    child: &mut Child,
    pid: Option<Pid>,
    signals: &mut Signals,
) -> Result<(), RunError> {
    let mut signalled = false;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status?,
            signal = signals.recv() => {
                signalled = true;
                forward(&spec.name, pid, signal);
            }
        }
    };

    info!(component = %spec.name, %status, signalled, "exited");

    if signalled || status.success() {
        Ok(())
    } else {
        Err(RunError::ExitStatus {
            name: spec.name.clone(),
            status: status.to_string(),
        })
    }
}

fn forward(name: &str, pid: Option<Pid>, signal: Signal) {
    let Some(pid) = pid else {
        return;
    };

    debug!(component = %name, %signal, "forwarding signal");
    if let Err(e) = kill(pid, signal.as_nix()) {
        warn!(component = %name, %signal, error = %e, "failed to signal process");
    }
}

fn pump_output<R>(
    spec: &CommandSpec,
    stream: &'static str,
    reader: R,
    log: Option<ComponentLog>,
    marker_tx: mpsc::Sender<()>,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let name = spec.name.clone();
    let marker = spec.started_when.clone();

    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match &log {
                Some(log) => log.write_line(&name, stream, &line),
                None => debug!(component = %name, stream, "{line}"),
            }

            if marker.as_deref().is_some_and(|m| line.contains(m)) {
                let _ = marker_tx.try_send(());
            }
        }
    });
}
