// src/proc/launcher.rs

//! Spawning the driver binary.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::errors::{DrivervisorError, Result};

/// An owned handle to a freshly spawned driver process.
///
/// The stdout/stderr pipes are already detached from the `Child` so the
/// supervisor can hand them to the readiness watcher and stderr forwarder
/// while keeping the `Child` itself for `wait()`/`kill()`.
pub struct DriverProcess {
    pub child: Child,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Spawn the driver binary with captured output streams.
///
/// - stdin is explicitly discarded; the driver is never fed input.
/// - stdout/stderr are piped, not inherited, so readiness detection and
///   diagnostics forwarding see every line.
/// - `kill_on_drop` guarantees the child dies even if the supervisor is
///   dropped without an explicit `stop()`.
///
/// A spawn failure (binary missing or not executable) surfaces here as
/// [`DrivervisorError::Spawn`]. Platforms that only report exec failure
/// after the fork show up instead as an immediate exit, which the
/// supervisor's exit-before-ready path reports as `ProcessExit`.
pub fn launch(config: &DriverConfig) -> Result<DriverProcess> {
    debug!(binary = %config.binary, args = ?config.args, "launching driver binary");

    let mut cmd = Command::new(&config.binary);
    cmd.args(&config.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Terminal signals (SIGINT, SIGTSTP) sent to the supervising process
    // must not reach the driver; it is stopped explicitly via stop().
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| DrivervisorError::Spawn {
        binary: config.binary.clone(),
        source,
    })?;

    info!(binary = %config.binary, pid = ?child.id(), "driver process spawned");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| pipe_error(config, "stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| pipe_error(config, "stderr"))?;

    Ok(DriverProcess {
        child,
        stdout,
        stderr,
    })
}

fn pipe_error(config: &DriverConfig, stream: &str) -> DrivervisorError {
    DrivervisorError::Spawn {
        binary: config.binary.clone(),
        source: io::Error::other(format!("{stream} pipe unavailable")),
    }
}
