//! Run configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::identifier::{DEFAULT_ID_PATTERN, PatternIdentifierExtractor};
use crate::orchestrator::RunMode;
use crate::{Result, RoundtripError};

/// Settings for one verification run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundtripConfig {
    /// Documentation file holding the examples
    pub examples_path: PathBuf,

    /// Publishing client executable
    pub publisher: PathBuf,

    /// Registry base URL
    pub registry_url: String,

    /// Deadline for each publish invocation
    pub publish_timeout_ms: u64,

    /// Time a timed-out publisher gets to exit before it is killed; also bounds
    /// how long its output is drained after it exits
    pub grace_period_ms: u64,

    /// Deadline for each registry read
    pub fetch_timeout_ms: u64,

    /// Directory for scoped example artifacts (system temp dir when unset)
    pub artifact_dir: Option<PathBuf>,

    /// Pattern recovering the assigned id from publisher output
    pub id_pattern: String,

    /// Continue past failing examples and report all outcomes
    pub keep_going: bool,

    /// Where to write JSON and Markdown reports
    pub report_dir: Option<PathBuf>,
}

impl Default for RoundtripConfig {
    fn default() -> Self {
        Self {
            examples_path: PathBuf::from("docs/server-json/examples.md"),
            publisher: PathBuf::from("./bin/publisher"),
            registry_url: "http://localhost:8080".to_string(),
            publish_timeout_ms: 5_000,
            grace_period_ms: 100,
            fetch_timeout_ms: 5_000,
            artifact_dir: None,
            id_pattern: DEFAULT_ID_PATTERN.to_string(),
            keep_going: false,
            report_dir: None,
        }
    }
}

impl RoundtripConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn run_mode(&self) -> RunMode {
        if self.keep_going {
            RunMode::KeepGoing
        } else {
            RunMode::FailFast
        }
    }

    /// Anchor relative paths at `base`, the directory holding the config file
    ///
    /// A publisher given as a bare program name is left for `PATH` lookup.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let anchor = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        anchor(&mut self.examples_path);
        if self.publisher.components().count() > 1 {
            anchor(&mut self.publisher);
        }
        if let Some(dir) = &mut self.artifact_dir {
            anchor(dir);
        }
        if let Some(dir) = &mut self.report_dir {
            anchor(dir);
        }
    }

    /// Check the settings before a run
    pub fn validate(&self) -> Result<()> {
        if self.publisher.as_os_str().is_empty() {
            return Err(RoundtripError::config_error("publisher path is empty"));
        }
        if !(self.registry_url.starts_with("http://") || self.registry_url.starts_with("https://"))
        {
            return Err(RoundtripError::config_error(format!(
                "registryUrl must start with http:// or https://, got '{}'",
                self.registry_url
            )));
        }
        for (name, value) in [
            ("publishTimeoutMs", self.publish_timeout_ms),
            ("gracePeriodMs", self.grace_period_ms),
            ("fetchTimeoutMs", self.fetch_timeout_ms),
        ] {
            if value == 0 {
                return Err(RoundtripError::config_error(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        PatternIdentifierExtractor::new(&self.id_pattern)?;
        Ok(())
    }
}
