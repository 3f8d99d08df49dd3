//! ProcessPublisher against generated shell scripts

#![cfg(unix)]

use roundtrip_core::{ErrorKind, ProcessPublisher, Publisher, RoundtripError};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Write an executable `/bin/sh` script into `dir`
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn test_captures_stdout_and_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(
        temp_dir.path(),
        "publisher",
        r#"echo "Publishing to registry"
echo "warning: deprecated field" >&2
echo '{"id": "abc123"}'"#,
    );

    let output = ProcessPublisher::new(&script)
        .publish(Path::new("example.json"), "http://localhost:8080")
        .await
        .unwrap();

    assert!(output.output.contains("Publishing to registry"));
    assert!(output.output.contains("warning: deprecated field"));
    assert!(output.output.contains(r#"{"id": "abc123"}"#));
}

#[tokio::test]
async fn test_passes_artifact_and_registry_flags() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "publisher", r#"echo "args: $*""#);

    let output = ProcessPublisher::new(&script)
        .publish(Path::new("/tmp/example-line-7.json"), "http://registry:9000")
        .await
        .unwrap();

    assert_eq!(
        output.output.trim(),
        "args: publish --mcp-file /tmp/example-line-7.json --registry-url http://registry:9000"
    );
}

#[tokio::test]
async fn test_non_zero_exit_surfaces_output() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(
        temp_dir.path(),
        "publisher",
        "echo 'Error: server name is required' >&2\nexit 3",
    );

    let err = ProcessPublisher::new(&script)
        .publish(Path::new("example.json"), "http://localhost:8080")
        .await
        .unwrap_err();

    match &err {
        RoundtripError::PublishFailed { status, output } => {
            assert!(status.contains('3'), "status was {status}");
            assert!(output.contains("server name is required"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Invocation);
    assert!(err.to_string().contains("server name is required"));
}

#[tokio::test]
async fn test_deadline_terminates_publisher() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(temp_dir.path(), "publisher", "echo starting\nexec sleep 30");

    let publisher = ProcessPublisher::new(&script)
        .with_timeout(Duration::from_millis(300))
        .with_grace_period(Duration::from_millis(50));

    let start = Instant::now();
    let err = publisher
        .publish(Path::new("example.json"), "http://localhost:8080")
        .await
        .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(10));
    match &err {
        RoundtripError::PublishTimedOut { timeout, output } => {
            assert_eq!(*timeout, Duration::from_millis(300));
            assert!(output.contains("starting"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Invocation);
}

#[tokio::test]
async fn test_deadline_kills_publisher_ignoring_sigterm() {
    let temp_dir = TempDir::new().unwrap();
    let script = write_script(
        temp_dir.path(),
        "publisher",
        "trap '' TERM\nwhile true; do sleep 1; done",
    );

    let publisher = ProcessPublisher::new(&script)
        .with_timeout(Duration::from_millis(200))
        .with_grace_period(Duration::from_millis(50));

    let start = Instant::now();
    let err = publisher
        .publish(Path::new("example.json"), "http://localhost:8080")
        .await
        .unwrap_err();

    assert!(matches!(err, RoundtripError::PublishTimedOut { .. }));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_missing_executable_is_environment_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = ProcessPublisher::new(temp_dir.path().join("bin/publisher"))
        .publish(Path::new("example.json"), "http://localhost:8080")
        .await
        .unwrap_err();

    assert!(matches!(err, RoundtripError::PublisherNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Environment);
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_non_executable_file_is_environment_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("publisher");
    fs::write(&path, "#!/bin/sh\necho hi\n").unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o644);
    fs::set_permissions(&path, perms).unwrap();

    let err = ProcessPublisher::new(&path)
        .publish(Path::new("example.json"), "http://localhost:8080")
        .await
        .unwrap_err();

    assert!(matches!(err, RoundtripError::PublisherNotFound { .. }));
}
