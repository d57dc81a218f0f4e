// src/errors.rs

//! Crate-wide error type.
//!
//! Every failure mode of a `start()` call is a distinct variant so that
//! callers (and tests) can tell a missing binary apart from a driver that
//! launched and then died, or one that simply never reported readiness.
//! `stop()` never produces an error.

use std::time::Duration;

use thiserror::Error;

use crate::supervisor::SupervisorState;

#[derive(Error, Debug)]
pub enum DrivervisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The driver binary could not be spawned at all (missing or not
    /// executable). Fatal, never retried internally.
    #[error("failed to spawn driver binary '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// The driver process exited before emitting the readiness marker.
    /// Carries the last stderr lines as diagnostic context.
    #[error("driver process exited before becoming ready (exit code {code}); stderr: {stderr_tail}")]
    ProcessExit { code: i32, stderr_tail: String },

    /// No readiness marker arrived within the configured deadline. The
    /// supervisor stays usable for another start after an explicit stop.
    #[error("driver did not become ready within {timeout:?}")]
    StartTimeout { timeout: Duration },

    /// Re-entrant `start()` call; rejected with no process side effect.
    #[error("supervisor already started (state: {state:?})")]
    AlreadyStarted { state: SupervisorState },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DrivervisorError>;
