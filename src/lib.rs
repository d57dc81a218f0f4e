// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod proc;
pub mod supervisor;

use std::path::PathBuf;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;

pub use crate::config::{ConfigFile, DriverConfig};
pub use crate::errors::{DrivervisorError, Result};
pub use crate::proc::{DiagnosticSink, StreamSource};
pub use crate::supervisor::{Supervisor, SupervisorState};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the driver supervisor (start → ready)
/// - the wrapped command (test suite), if any
/// - Ctrl-C handling and driver shutdown
///
/// Returns the process exit code drivervisor should finish with.
pub async fn run(args: CliArgs) -> anyhow::Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let mut supervisor = Supervisor::new(cfg.driver.clone());
    if let Err(err) = supervisor.start().await {
        supervisor.stop().await;
        return Err(err.into());
    }
    info!(pid = ?supervisor.pid(), "driver is ready");

    let exit_code = match wrapped_command(&args, &cfg) {
        Some(cmd) => run_wrapped_command(&cmd).await?,
        None => {
            info!("no command configured; supervising driver until Ctrl-C");
            tokio::signal::ctrl_c().await?;
            0
        }
    };

    supervisor.stop().await;
    Ok(exit_code)
}

/// Trailing CLI arguments win over `[run].cmd`.
fn wrapped_command(args: &CliArgs, cfg: &ConfigFile) -> Option<String> {
    if !args.command.is_empty() {
        return Some(args.command.join(" "));
    }
    cfg.run.cmd.clone()
}

/// Run the wrapped command with inherited stdio.
///
/// Ctrl-C kills the command and falls through to driver shutdown in `run`.
async fn run_wrapped_command(cmd: &str) -> anyhow::Result<i32> {
    info!(cmd = %cmd, "running wrapped command");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };
    command.kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning wrapped command '{cmd}'"))?;

    tokio::select! {
        status = child.wait() => {
            let status = status.context("waiting for wrapped command")?;
            let code = status.code().unwrap_or(-1);
            info!(exit_code = code, success = status.success(), "wrapped command exited");
            Ok(code)
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received; killing wrapped command");
            if let Err(err) = child.kill().await {
                warn!(error = %err, "failed to kill wrapped command");
            }
            Ok(130)
        }
    }
}

/// Simple dry-run output: print the resolved driver and run settings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("drivervisor dry-run");
    println!("  driver.binary = {}", cfg.driver.binary);
    println!("  driver.args = {:?}", cfg.driver.args);
    println!("  driver.ready_marker = {:?}", cfg.driver.ready_marker);
    println!("  driver.startup_timeout = {:?}", cfg.driver.startup_timeout);
    match &cfg.run.cmd {
        Some(cmd) => println!("  run.cmd = {cmd}"),
        None => println!("  run.cmd = (none)"),
    }

    debug!("dry-run complete (no execution)");
}
