#![allow(dead_code)]

//! Fake driver binaries for integration tests.
//!
//! Each builder writes a small `sh` script into a temp directory and returns
//! a handle that keeps the directory alive for the duration of the test.
//! The scripts imitate the observable behaviours of a real native WebDriver
//! binary: announce a listening endpoint on stdout, log noise, die early
//! with a complaint on stderr, or hang silently.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use drivervisor::DriverConfig;
use tempfile::TempDir;

pub struct FakeDriver {
    _dir: TempDir,
    path: PathBuf,
}

#[cfg(unix)]
impl FakeDriver {
    /// Emits `ready_line` on stdout after `delay`, then stays up.
    pub fn ready_after(delay: Duration, ready_line: &str) -> std::io::Result<Self> {
        Self::from_script(&format!(
            "#!/bin/sh\nsleep {}\necho '{}'\nsleep 60\n",
            delay.as_secs_f64(),
            ready_line
        ))
    }

    /// Prints each `noise` line, then `ready_line`, then stays up.
    pub fn noisy_then_ready(noise: &[&str], ready_line: &str) -> std::io::Result<Self> {
        let mut body = String::from("#!/bin/sh\n");
        for line in noise {
            body.push_str(&format!("echo '{line}'\n"));
        }
        body.push_str(&format!("echo '{ready_line}'\nsleep 60\n"));
        Self::from_script(&body)
    }

    /// Never emits anything on stdout; just stays up.
    pub fn silent() -> std::io::Result<Self> {
        Self::from_script("#!/bin/sh\nsleep 60\n")
    }

    /// Writes `stderr_line` to stderr (if non-empty) and exits with `code`.
    pub fn exits(code: i32, stderr_line: &str) -> std::io::Result<Self> {
        let mut body = String::from("#!/bin/sh\n");
        if !stderr_line.is_empty() {
            body.push_str(&format!("echo '{stderr_line}' >&2\n"));
        }
        body.push_str(&format!("exit {code}\n"));
        Self::from_script(&body)
    }

    /// Emits `line` on **stderr** only and stays up; stdout stays silent.
    pub fn stderr_only(line: &str) -> std::io::Result<Self> {
        Self::from_script(&format!("#!/bin/sh\necho '{line}' >&2\nsleep 60\n"))
    }

    fn from_script(body: &str) -> std::io::Result<Self> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("fake-driver.sh");
        fs::write(&path, body)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;

        Ok(Self { _dir: dir, path })
    }
}

impl FakeDriver {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Driver config pointing at this fake, with the given marker and
    /// startup timeout.
    pub fn config(&self, ready_marker: &str, startup_timeout: Duration) -> DriverConfig {
        DriverConfig {
            binary: self.path.to_string_lossy().into_owned(),
            args: Vec::new(),
            ready_marker: ready_marker.to_string(),
            startup_timeout,
        }
    }
}
