// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `drivervisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "drivervisor",
    version,
    about = "Launch a native WebDriver binary, wait until it is ready, and supervise it for the duration of a test run.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Drivervisor.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Drivervisor.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DRIVERVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved config, but don't spawn anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run once the driver is ready (overrides `[run].cmd`).
    ///
    /// The driver is stopped when the command exits, and drivervisor exits
    /// with the command's status code.
    #[arg(trailing_var_arg = true, value_name = "CMD")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
