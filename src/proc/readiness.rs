// src/proc/readiness.rs

//! Stdout readiness detection and stderr forwarding.
//!
//! Both functions are fire-and-forget: they spawn background Tokio tasks
//! that run until their stream closes. The supervisor communicates with
//! them only through the returned oneshot receiver / tail handle, so
//! dropping the receiver (e.g. when the startup race is lost) detaches the
//! watcher without any explicit listener bookkeeping.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{DiagnosticSink, StreamSource};

/// Bounded stderr history, attached to `ProcessExit` errors as diagnostic
/// context.
pub type StderrTail = Arc<Mutex<VecDeque<String>>>;

const STDERR_TAIL_LINES: usize = 40;

/// Watch the driver's stdout for the readiness marker.
///
/// The returned receiver resolves when any stdout line *contains* the
/// marker substring. Substring-on-any-line matching tolerates drivers that
/// interleave unrelated log lines before the readiness line; the marker is
/// expected to be a distinctive, driver-specific phrase.
///
/// The oneshot sender is consumed on the first match, so the signal fires
/// at most once no matter how much output follows. Lines seen before the
/// marker are forwarded to the sink; after the marker (and after the
/// receiver has been dropped) the task keeps draining the stream so OS
/// pipe buffers never fill. Stdout EOF before the marker drops the sender,
/// which the supervisor observes as a closed channel.
pub fn watch_stdout(
    stdout: ChildStdout,
    marker: String,
    sink: DiagnosticSink,
) -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let reader = BufReader::new(stdout);
        let mut lines = reader.lines();
        let mut ready_tx = Some(tx);

        while let Ok(Some(line)) = lines.next_line().await {
            match ready_tx.take() {
                Some(tx) if line.contains(&marker) => {
                    debug!("readiness marker seen: {}", line);
                    let _ = tx.send(());
                }
                Some(tx) => {
                    ready_tx = Some(tx);
                    sink(StreamSource::Stdout, &line);
                }
                None => sink(StreamSource::Stdout, &line),
            }
        }

        debug!("stdout watcher finished (stream closed)");
    });

    rx
}

/// Forward the driver's stderr to the diagnostic sink.
///
/// Stderr is never inspected for readiness. Every line is pushed into a
/// bounded tail buffer (last lines only) that the supervisor attaches to
/// `ProcessExit` errors when the driver dies before becoming ready.
pub fn forward_stderr(stderr: ChildStderr, sink: DiagnosticSink) -> (StderrTail, JoinHandle<()>) {
    let tail: StderrTail = Arc::new(Mutex::new(VecDeque::new()));
    let tail_writer = Arc::clone(&tail);

    let handle = tokio::spawn(async move {
        let reader = BufReader::new(stderr);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            sink(StreamSource::Stderr, &line);

            let mut guard = tail_writer.lock().unwrap_or_else(|e| e.into_inner());
            if guard.len() == STDERR_TAIL_LINES {
                guard.pop_front();
            }
            guard.push_back(line);
        }

        debug!("stderr forwarder finished (stream closed)");
    });

    (tail, handle)
}

/// Collect the stderr tail after the driver exited.
///
/// Waits briefly for the forwarder task so lines the process wrote just
/// before dying are not lost to the pipe.
pub async fn drain_tail(tail: &StderrTail, forwarder: JoinHandle<()>) -> String {
    let _ = tokio::time::timeout(Duration::from_millis(500), forwarder).await;

    let guard = tail.lock().unwrap_or_else(|e| e.into_inner());
    guard.iter().cloned().collect::<Vec<_>>().join("\n")
}
