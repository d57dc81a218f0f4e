// tests/readiness_detection.rs
#![cfg(unix)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use drivervisor::proc::{forward_stderr, launch, watch_stdout, DriverProcess};
use drivervisor::{DiagnosticSink, StreamSource};
use drivervisor_test_utils::{fake_driver::FakeDriver, init_tracing};
use tokio::time::timeout;

type SeenLines = Arc<Mutex<Vec<(StreamSource, String)>>>;

fn collecting_sink() -> (DiagnosticSink, SeenLines) {
    let seen: SeenLines = Arc::new(Mutex::new(Vec::new()));
    let writer = Arc::clone(&seen);
    let sink: DiagnosticSink = Arc::new(move |source, line: &str| {
        writer.lock().unwrap().push((source, line.to_string()));
    });
    (sink, seen)
}

#[tokio::test]
async fn marker_substring_is_detected_mid_line() {
    init_tracing();

    let driver = FakeDriver::noisy_then_ready(&[], "prefix Listening on 1.2.3.4 suffix")
        .expect("write fake driver");
    let config = driver.config("Listening on", Duration::from_secs(5));

    let DriverProcess {
        child: _child,
        stdout,
        stderr: _stderr,
    } = launch(&config).expect("launch fake driver");

    let (sink, _) = collecting_sink();
    let rx = watch_stdout(stdout, config.ready_marker.clone(), sink);

    timeout(Duration::from_secs(3), rx)
        .await
        .expect("marker should be seen within 3s")
        .expect("watcher must fire, not drop");
    // _child is killed on drop via kill_on_drop.
}

#[tokio::test]
async fn non_marker_lines_reach_the_sink() {
    init_tracing();

    let driver = FakeDriver::noisy_then_ready(&["booting", "loading config"], "Listening on 4444")
        .expect("write fake driver");
    let config = driver.config("Listening on", Duration::from_secs(5));

    let DriverProcess {
        child: _child,
        stdout,
        stderr: _stderr,
    } = launch(&config).expect("launch fake driver");

    let (sink, seen) = collecting_sink();
    let rx = watch_stdout(stdout, config.ready_marker.clone(), sink);

    timeout(Duration::from_secs(3), rx)
        .await
        .expect("marker should be seen within 3s")
        .expect("watcher must fire");

    let seen = seen.lock().unwrap();
    let stdout_lines: Vec<&str> = seen
        .iter()
        .filter(|(s, _)| *s == StreamSource::Stdout)
        .map(|(_, l)| l.as_str())
        .collect();
    assert!(stdout_lines.contains(&"booting"), "got: {stdout_lines:?}");
    assert!(stdout_lines.contains(&"loading config"), "got: {stdout_lines:?}");
    // The marker line itself resolves the signal instead of being forwarded.
    assert!(
        stdout_lines.iter().all(|l| !l.contains("Listening on")),
        "marker line must not be forwarded: {stdout_lines:?}"
    );
}

#[tokio::test]
async fn stderr_is_never_scanned_for_readiness() {
    init_tracing();

    let driver = FakeDriver::stderr_only("Listening on 4444").expect("write fake driver");
    let config = driver.config("Listening on", Duration::from_secs(5));

    let DriverProcess {
        child: _child,
        stdout,
        stderr,
    } = launch(&config).expect("launch fake driver");

    let (sink, seen) = collecting_sink();
    let rx = watch_stdout(stdout, config.ready_marker.clone(), sink.clone());
    let (tail, _forwarder) = forward_stderr(stderr, sink);

    // Even though stderr printed the marker text, no readiness signal may
    // arrive.
    assert!(
        timeout(Duration::from_millis(400), rx).await.is_err(),
        "stdout watcher must not resolve from stderr output"
    );

    let seen = seen.lock().unwrap();
    assert!(
        seen.iter()
            .any(|(s, l)| *s == StreamSource::Stderr && l.contains("Listening on")),
        "stderr line should have been forwarded to the sink: {seen:?}"
    );

    let tail_lines = tail.lock().unwrap();
    assert!(
        tail_lines.iter().any(|l| l.contains("Listening on")),
        "stderr line should be in the diagnostic tail"
    );
}

#[tokio::test]
async fn stdout_eof_without_marker_drops_the_signal() {
    init_tracing();

    let driver = FakeDriver::exits(0, "").expect("write fake driver");
    let config = driver.config("ready", Duration::from_secs(5));

    let DriverProcess {
        child: _child,
        stdout,
        stderr: _stderr,
    } = launch(&config).expect("launch fake driver");

    let (sink, _) = collecting_sink();
    let rx = watch_stdout(stdout, config.ready_marker.clone(), sink);

    let res = timeout(Duration::from_secs(3), rx)
        .await
        .expect("watcher should end quickly after the process exits");
    assert!(res.is_err(), "sender must be dropped on EOF without marker");
}
