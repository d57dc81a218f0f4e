// src/proc/mod.rs

//! Driver-process layer.
//!
//! This module is responsible for actually running the driver binary, using
//! `tokio::process::Command`, and for observing its output streams:
//!
//! - [`launcher`] spawns the driver with captured stdout/stderr and a
//!   discarded stdin.
//! - [`readiness`] owns the stdout readiness watcher and the stderr
//!   forwarder with its bounded diagnostic tail.
//!
//! Both output streams are consumed exclusively here; no other component
//! attaches readers to them, so a readiness marker can never be consumed
//! twice.

pub mod launcher;
pub mod readiness;

pub use launcher::{launch, DriverProcess};
pub use readiness::{drain_tail, forward_stderr, watch_stdout, StderrTail};

use std::sync::Arc;

use tracing::{debug, error, info, warn, Level};

/// Which stream a forwarded diagnostic line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// Caller-supplied diagnostics sink.
///
/// Receives every stderr line and every non-marker stdout line. This is a
/// one-way notification; the supervisor never looks at a return value. The
/// sink is invoked from background reader tasks, so a panicking sink cannot
/// unwind into the supervisor's control flow.
pub type DiagnosticSink = Arc<dyn Fn(StreamSource, &str) + Send + Sync>;

/// Default sink used by `Supervisor::new`: forwards driver output to
/// `tracing`, classifying stderr lines into levels by content.
pub fn tracing_sink(driver: &str) -> DiagnosticSink {
    let driver = driver.to_string();
    Arc::new(move |source, line| match source {
        StreamSource::Stdout => debug!(driver = %driver, "stdout: {}", line),
        StreamSource::Stderr => {
            let level = classify_stderr_line(line);
            if level == Level::ERROR {
                error!(driver = %driver, "stderr: {}", line);
            } else if level == Level::WARN {
                warn!(driver = %driver, "stderr: {}", line);
            } else if level == Level::DEBUG {
                debug!(driver = %driver, "stderr: {}", line);
            } else {
                info!(driver = %driver, "stderr: {}", line);
            }
        }
    })
}

/// Classify a stderr line into a log level based on content heuristics.
///
/// Driver binaries log freely to stderr; this keeps genuine failures visible
/// at `error` without drowning the log in noise.
fn classify_stderr_line(line: &str) -> Level {
    let lower = line.to_lowercase();
    if lower.contains("error") || lower.contains("panic") || lower.contains("fatal") {
        Level::ERROR
    } else if lower.contains("warn") {
        Level::WARN
    } else if lower.contains("debug") || lower.contains("trace") {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_lines_with_failure_words_classify_as_error() {
        assert_eq!(classify_stderr_line("ERROR: bind failed"), Level::ERROR);
        assert_eq!(classify_stderr_line("thread 'main' panicked"), Level::ERROR);
        assert_eq!(classify_stderr_line("fatal: no display"), Level::ERROR);
    }

    #[test]
    fn stderr_lines_classify_warn_and_debug() {
        assert_eq!(classify_stderr_line("WARN: deprecated flag"), Level::WARN);
        assert_eq!(classify_stderr_line("debug: session created"), Level::DEBUG);
        assert_eq!(classify_stderr_line("trace: frame sent"), Level::DEBUG);
    }

    #[test]
    fn ordinary_stderr_lines_default_to_info() {
        assert_eq!(
            classify_stderr_line("Listening on 127.0.0.1:4444"),
            Level::INFO
        );
    }
}
