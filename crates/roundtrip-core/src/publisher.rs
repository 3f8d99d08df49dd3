//! Publishing client invocation
//!
//! [`ProcessPublisher`] runs the external publishing client as a subprocess,
//! bounded by a deadline. On expiry the client is asked to terminate
//! (SIGTERM on unix), given a grace period, and then killed. Standard output
//! and standard error are captured into one blob in arrival order.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Result, RoundtripError};

/// Default deadline for one publish invocation
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time a client gets to exit and flush its output after the deadline
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(100);

/// Captured result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutput {
    /// Combined standard output and standard error
    pub output: String,
}

/// Submits an example artifact to the registry
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, artifact: &Path, registry_url: &str) -> Result<PublishOutput>;
}

/// Runs `<program> publish --mcp-file <artifact> --registry-url <url>`
#[derive(Debug, Clone)]
pub struct ProcessPublisher {
    program: PathBuf,
    timeout: Duration,
    grace_period: Duration,
}

impl ProcessPublisher {
    /// Create a publisher for the given executable with default timeouts
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_PUBLISH_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, artifact: &Path, registry_url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("publish")
            .arg("--mcp-file")
            .arg(artifact)
            .arg("--registry-url")
            .arg(registry_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> RoundtripError {
        match source.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                RoundtripError::PublisherNotFound {
                    program: self.program.clone(),
                    source,
                }
            }
            _ => RoundtripError::PublisherSpawn {
                program: self.program.clone(),
                source,
            },
        }
    }

    /// Ask the child to stop, then kill it once the grace period runs out
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            // SAFETY: `pid` is our own child and has not been reaped yet.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            if tokio::time::timeout(self.grace_period, child.wait())
                .await
                .is_ok()
            {
                return;
            }
        }

        if let Err(e) = child.start_kill() {
            debug!("Failed to kill publisher: {}", e);
        }
        if let Err(e) = child.wait().await {
            debug!("Failed to reap publisher: {}", e);
        }
    }

    /// Wait for the output pumps, giving up after the grace period
    async fn drain(&self, mut pumps: Vec<JoinHandle<io::Result<()>>>) {
        let finished =
            tokio::time::timeout(self.grace_period, futures::future::join_all(pumps.iter_mut()))
                .await;
        match finished {
            Ok(results) => {
                for result in results {
                    match result {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => debug!("Error reading publisher output: {}", e),
                        Err(e) => debug!("Publisher output reader failed: {}", e),
                    }
                }
            }
            Err(_) => {
                warn!("Publisher output still open after exit; discarding the rest");
                for pump in &pumps {
                    pump.abort();
                }
            }
        }
    }
}

#[async_trait]
impl Publisher for ProcessPublisher {
    async fn publish(&self, artifact: &Path, registry_url: &str) -> Result<PublishOutput> {
        debug!(
            "Running {} publish --mcp-file {} --registry-url {}",
            self.program.display(),
            artifact.display(),
            registry_url
        );

        let mut child = self
            .command(artifact, registry_url)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let sink = Arc::new(Mutex::new(Vec::new()));
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(tokio::spawn(pump(stdout, Arc::clone(&sink))));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(tokio::spawn(pump(stderr, Arc::clone(&sink))));
        }

        let status: Option<ExitStatus> =
            match tokio::time::timeout(self.timeout, child.wait()).await {
                Ok(status) => Some(status.map_err(|e| RoundtripError::PublisherSpawn {
                    program: self.program.clone(),
                    source: e,
                })?),
                Err(_) => {
                    info!(
                        "Publisher exceeded {}ms deadline; terminating",
                        self.timeout.as_millis()
                    );
                    self.terminate(&mut child).await;
                    None
                }
            };

        self.drain(pumps).await;
        let output = {
            let bytes = sink.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        };

        match status {
            None => Err(RoundtripError::PublishTimedOut {
                timeout: self.timeout,
                output,
            }),
            Some(status) if !status.success() => Err(RoundtripError::PublishFailed {
                status: status.to_string(),
                output,
            }),
            Some(_) => Ok(PublishOutput { output }),
        }
    }
}

async fn pump<R>(mut reader: R, sink: Arc<Mutex<Vec<u8>>>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&buf[..n]);
    }
}

/// Indent captured output for display under a progress line
pub fn indent_output(output: &str) -> String {
    output
        .trim()
        .lines()
        .map(|line| format!("\t{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_output() {
        assert_eq!(indent_output("a\nb\n"), "\ta\n\tb");
        assert_eq!(indent_output(""), "");
    }

    #[test]
    fn test_builder() {
        let publisher = ProcessPublisher::new("./bin/publisher")
            .with_timeout(Duration::from_secs(1))
            .with_grace_period(Duration::from_millis(10));
        assert_eq!(publisher.program(), Path::new("./bin/publisher"));
        assert_eq!(publisher.timeout, Duration::from_secs(1));
        assert_eq!(publisher.grace_period, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_missing_program_is_environment_error() {
        let publisher = ProcessPublisher::new("/nonexistent/definitely/not/here/publisher");
        let err = publisher
            .publish(Path::new("example.json"), "http://localhost:1")
            .await
            .unwrap_err();
        assert!(matches!(err, RoundtripError::PublisherNotFound { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Environment);
    }
}
