// src/supervisor.rs

//! Driver lifecycle controller.
//!
//! One `Supervisor` owns at most one live driver process at a time. All
//! methods take `&mut self`, so no two lifecycle reactions for the same
//! instance can run concurrently and the state field needs no lock.
//! Multiple independent supervisors can coexist in one test process.

use std::time::Duration;

use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::errors::{DrivervisorError, Result};
use crate::proc::{self, DiagnosticSink, DriverProcess, StderrTail};

/// Where the supervisor is in the driver's lifecycle.
///
/// A driver process may only be associated with `Starting`, `Ready`, or
/// `Failed` (after a startup timeout, until `stop()` cleans it up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NotStarted,
    Starting,
    Ready,
    Failed,
    Terminated,
}

/// How long to wait for an exit status once stdout closed without the
/// readiness marker.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Outcome of the startup race; whichever branch wins drops the others.
enum StartRace {
    Ready,
    Exited(std::io::Result<std::process::ExitStatus>),
    StdoutClosed,
    TimedOut,
}

pub struct Supervisor {
    config: DriverConfig,
    sink: DiagnosticSink,
    state: SupervisorState,
    child: Option<Child>,
    pid: Option<u32>,
}

impl Supervisor {
    /// Create a supervisor that forwards driver output to `tracing`.
    pub fn new(config: DriverConfig) -> Self {
        let sink = proc::tracing_sink(&config.binary);
        Self::with_sink(config, sink)
    }

    /// Create a supervisor with a caller-supplied diagnostics sink.
    pub fn with_sink(config: DriverConfig, sink: DiagnosticSink) -> Self {
        Self {
            config,
            sink,
            state: SupervisorState::NotStarted,
            child: None,
            pid: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Pid of the live driver process, if any.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Launch the driver and wait until it is ready.
    ///
    /// Resolves once the readiness marker appears on the driver's stdout.
    /// Fails with:
    /// - [`DrivervisorError::AlreadyStarted`] if this supervisor already
    ///   holds a start (no second process is spawned);
    /// - [`DrivervisorError::Spawn`] if the binary cannot be spawned;
    /// - [`DrivervisorError::ProcessExit`] if the driver exits (any code)
    ///   before the marker;
    /// - [`DrivervisorError::StartTimeout`] if the configured deadline
    ///   elapses first. The driver keeps running in that case until
    ///   `stop()` reclaims it.
    ///
    /// The three waits are raced in one `select!`; the losing branches are
    /// dropped in place, so a late marker or a stray timer cannot resurrect
    /// a settled start.
    pub async fn start(&mut self) -> Result<()> {
        match self.state {
            SupervisorState::NotStarted | SupervisorState::Terminated => {}
            state => return Err(DrivervisorError::AlreadyStarted { state }),
        }
        self.state = SupervisorState::Starting;

        let DriverProcess {
            mut child,
            stdout,
            stderr,
        } = match proc::launch(&self.config) {
            Ok(process) => process,
            Err(err) => {
                self.state = SupervisorState::Failed;
                return Err(err);
            }
        };
        self.pid = child.id();

        let mut ready_rx = proc::watch_stdout(
            stdout,
            self.config.ready_marker.clone(),
            self.sink.clone(),
        );
        let (tail, stderr_task) = proc::forward_stderr(stderr, self.sink.clone());

        let timeout = self.config.startup_timeout;
        let race = tokio::select! {
            res = &mut ready_rx => match res {
                Ok(()) => StartRace::Ready,
                Err(_) => StartRace::StdoutClosed,
            },
            status = child.wait() => StartRace::Exited(status),
            _ = sleep(timeout) => StartRace::TimedOut,
        };

        match race {
            StartRace::Ready => {
                self.child = Some(child);
                self.state = SupervisorState::Ready;
                info!(pid = ?self.pid, "driver reported readiness");
                Ok(())
            }
            StartRace::Exited(status) => {
                let code = match status {
                    Ok(status) => status.code().unwrap_or(-1),
                    Err(err) => {
                        warn!(error = %err, "failed to collect driver exit status");
                        -1
                    }
                };
                Err(self.fail_with_exit(code, &tail, stderr_task).await)
            }
            StartRace::StdoutClosed => {
                // Stdout hit EOF without the marker, so readiness can never
                // arrive; collect the exit status or put the process down.
                let code = match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                    Ok(Ok(status)) => status.code().unwrap_or(-1),
                    Ok(Err(err)) => {
                        warn!(error = %err, "failed to reap driver after stdout closed");
                        -1
                    }
                    Err(_) => {
                        warn!("driver closed stdout without becoming ready; killing it");
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        -1
                    }
                };
                Err(self.fail_with_exit(code, &tail, stderr_task).await)
            }
            StartRace::TimedOut => {
                warn!(?timeout, "driver did not report readiness in time");
                // Keep the process; stop() owns the cleanup.
                self.child = Some(child);
                self.state = SupervisorState::Failed;
                Err(DrivervisorError::StartTimeout { timeout })
            }
        }
    }

    /// Terminate the driver process, if any.
    ///
    /// Idempotent and infallible: safe from every state, including before
    /// the first `start()` and after a previous `stop()`. The kill request
    /// is issued synchronously within the call; the await only reaps the
    /// child. Afterwards the supervisor holds no process reference and a
    /// new `start()` is permitted.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = ?child.id(), "stopping driver process");

            if let Err(err) = child.start_kill() {
                // Already-dead processes make this a no-op.
                debug!(error = %err, "kill request failed (process already gone)");
            }

            match child.wait().await {
                Ok(status) => debug!(%status, "driver process terminated"),
                Err(err) => warn!(error = %err, "failed to reap driver process"),
            }
        }

        self.pid = None;
        self.state = SupervisorState::Terminated;
    }

    async fn fail_with_exit(
        &mut self,
        code: i32,
        tail: &StderrTail,
        forwarder: JoinHandle<()>,
    ) -> DrivervisorError {
        self.state = SupervisorState::Failed;
        self.pid = None;

        let stderr_tail = proc::drain_tail(tail, forwarder).await;
        warn!(exit_code = code, "driver exited before becoming ready");

        DrivervisorError::ProcessExit { code, stderr_tail }
    }
}
