//! Publish → fetch → compare orchestration
//!
//! Examples are processed strictly in document order. For each one the
//! orchestrator decodes the content, writes it to a scoped artifact, runs the
//! publisher, recovers the assigned identifier, fetches the stored record and
//! compares it field by field against the example.
//!
//! Only a decode failure is recovered from (the example is skipped). In
//! [`RunMode::FailFast`] any other failure ends the run immediately; in
//! [`RunMode::KeepGoing`] it is recorded and the next example is attempted.
//! Input and environment errors abort in both modes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::compare::compare_fields;
use crate::config::RoundtripConfig;
use crate::extract::Example;
use crate::identifier::{IdentifierExtractor, PatternIdentifierExtractor};
use crate::publisher::{ProcessPublisher, Publisher};
use crate::registry::{HttpRegistry, Registry};
use crate::report::{ExampleReport, ExampleStatus, RunReport};
use crate::{Result, RoundtripError};

/// How failures other than decode errors affect the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Stop at the first failing example
    #[default]
    FailFast,
    /// Record failures and continue with the remaining examples
    KeepGoing,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::FailFast => f.write_str("fail-fast"),
            RunMode::KeepGoing => f.write_str("keep-going"),
        }
    }
}

/// Per-example progress notifications
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Processing of an example began
    Started {
        index: usize,
        total: usize,
        line: usize,
    },
    /// The example isn't valid JSON and was skipped
    Skipped { line: usize, reason: String },
    /// The publisher exited successfully
    Published { line: usize, output: String },
    /// The stored record matches the example
    Verified { line: usize, identifier: String },
    /// A check failed
    Failed { line: usize, message: String },
}

/// Progress reporting callback type
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Report of a run together with the error that ended it early, if any
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub error: Option<RoundtripError>,
}

impl RunOutcome {
    fn aborted(report: RunReport, error: RoundtripError) -> Self {
        Self {
            report,
            error: Some(error),
        }
    }

    /// The report, or the error that stopped the run
    pub fn into_result(self) -> Result<RunReport> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.report),
        }
    }
}

/// Drives the per-example round trip
pub struct PublishOrchestrator {
    publisher: Arc<dyn Publisher>,
    registry: Arc<dyn Registry>,
    identifiers: Arc<dyn IdentifierExtractor>,
    artifact_dir: Option<PathBuf>,
    mode: RunMode,
    progress: Option<ProgressCallback>,
}

impl PublishOrchestrator {
    /// Create an orchestrator with the default identifier pattern, fail-fast mode,
    /// and artifacts in the system temp directory
    pub fn new(publisher: Arc<dyn Publisher>, registry: Arc<dyn Registry>) -> Self {
        Self {
            publisher,
            registry,
            identifiers: Arc::new(PatternIdentifierExtractor::default()),
            artifact_dir: None,
            mode: RunMode::default(),
            progress: None,
        }
    }

    /// Build the process publisher and HTTP registry described by `config`
    pub fn from_config(config: &RoundtripConfig) -> Result<Self> {
        config.validate()?;

        let publisher = ProcessPublisher::new(&config.publisher)
            .with_timeout(config.publish_timeout())
            .with_grace_period(config.grace_period());
        let registry = HttpRegistry::new(&config.registry_url, config.fetch_timeout())?;
        let identifiers = PatternIdentifierExtractor::new(&config.id_pattern)?;

        let mut orchestrator = Self::new(Arc::new(publisher), Arc::new(registry))
            .with_identifier_extractor(Arc::new(identifiers))
            .with_mode(config.run_mode());
        if let Some(dir) = &config.artifact_dir {
            orchestrator = orchestrator.with_artifact_dir(dir.clone());
        }
        Ok(orchestrator)
    }

    pub fn with_identifier_extractor(mut self, identifiers: Arc<dyn IdentifierExtractor>) -> Self {
        self.identifiers = identifiers;
        self
    }

    /// Write scoped artifacts into `dir` (created on demand)
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    /// Process every example in order and report the outcome
    ///
    /// Returns `Err` for fatal errors and, in fail-fast mode, for the first
    /// failing example. A returned report may still be incomplete (skipped or,
    /// in keep-going mode, failed examples); see [`RunReport::ensure_complete`].
    pub async fn run(&self, examples: &[Example]) -> Result<RunReport> {
        self.run_with_report(examples).await.into_result()
    }

    /// Like [`run`](Self::run), but keeps the partial report of an aborted run
    ///
    /// The example that ended the run is recorded as failed.
    pub async fn run_with_report(&self, examples: &[Example]) -> RunOutcome {
        let mut report = RunReport::new(self.mode, self.registry.base_url(), examples.len());

        for (index, example) in examples.iter().enumerate() {
            info!("Publishing example starting on line {}", example.line);
            self.emit(ProgressEvent::Started {
                index,
                total: examples.len(),
                line: example.line,
            });

            let start = Instant::now();
            let mut identifier = None;
            let outcome = self.attempt(example, &mut identifier).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => {
                    info!("Registry response matches example on line {}", example.line);
                    if let Some(id) = &identifier {
                        self.emit(ProgressEvent::Verified {
                            line: example.line,
                            identifier: id.clone(),
                        });
                    }
                    report.add(ExampleReport {
                        line: example.line,
                        status: ExampleStatus::Verified,
                        identifier,
                        message: None,
                        duration_ms,
                    });
                }
                Err(err) if err.is_recoverable() => {
                    info!("Skipping example: {}", err);
                    self.emit(ProgressEvent::Skipped {
                        line: example.line,
                        reason: err.to_string(),
                    });
                    report.add(ExampleReport {
                        line: example.line,
                        status: ExampleStatus::Skipped,
                        identifier,
                        message: Some(err.to_string()),
                        duration_ms,
                    });
                }
                Err(err) => {
                    info!("Example on line {} failed: {}", example.line, err);
                    self.emit(ProgressEvent::Failed {
                        line: example.line,
                        message: err.to_string(),
                    });
                    report.add(ExampleReport {
                        line: example.line,
                        status: ExampleStatus::Failed,
                        identifier,
                        message: Some(err.to_string()),
                        duration_ms,
                    });
                    if err.is_fatal() {
                        return RunOutcome::aborted(report, err);
                    }
                    if self.mode == RunMode::FailFast {
                        return RunOutcome::aborted(report, err.for_example(example.line));
                    }
                }
            }
        }

        info!("{}", report.summary());
        RunOutcome {
            report,
            error: None,
        }
    }

    /// Round-trip a single example, returning the identifier it was stored under
    pub async fn verify_example(&self, example: &Example) -> Result<String> {
        let mut identifier = None;
        self.attempt(example, &mut identifier).await?;
        identifier.ok_or_else(|| RoundtripError::internal_error("verified example has no id"))
    }

    async fn attempt(&self, example: &Example, identifier: &mut Option<String>) -> Result<()> {
        let expected: Map<String, Value> =
            serde_json::from_slice(&example.content).map_err(|source| {
                RoundtripError::InvalidExample {
                    line: example.line,
                    source,
                }
            })?;

        // Removed when dropped, on every exit path below.
        let artifact = self.write_artifact(example)?;
        debug!("Wrote example to {}", artifact.path().display());

        let published = self
            .publisher
            .publish(artifact.path(), self.registry.base_url())
            .await?;
        self.emit(ProgressEvent::Published {
            line: example.line,
            output: published.output.clone(),
        });

        let id = self
            .identifiers
            .extract(&published.output)
            .ok_or_else(|| RoundtripError::MissingIdentifier {
                output: published.output.clone(),
            })?;
        debug!("Example on line {} was assigned id {}", example.line, id);
        *identifier = Some(id.clone());

        let record = self.registry.fetch_server(&id).await?;
        compare_fields(&expected, &record)
    }

    fn write_artifact(&self, example: &Example) -> Result<NamedTempFile> {
        let dir = self
            .artifact_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&dir).map_err(|e| RoundtripError::io_error(&dir, e))?;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("example-line-{}-", example.line))
            .suffix(".json")
            .tempfile_in(&dir)
            .map_err(|e| RoundtripError::io_error(&dir, e))?;
        let path = file.path().to_path_buf();
        file.write_all(&example.content)
            .map_err(|e| RoundtripError::io_error(path, e))?;
        Ok(file)
    }
}
