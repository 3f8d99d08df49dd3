//! Run reports
//!
//! Every run records one [`ExampleReport`] per attempted example. The report
//! can be rendered as Markdown and saved next to a JSON copy.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::orchestrator::RunMode;
use crate::{Result, RoundtripError};

/// Outcome of one example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleStatus {
    /// Published, fetched back, and matched field by field
    Verified,
    /// Not valid JSON; never published
    Skipped,
    /// A publish, fetch, or comparison check failed
    Failed,
}

/// Result of processing a single example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleReport {
    /// Line the example starts on
    pub line: usize,
    pub status: ExampleStatus,
    /// Identifier assigned by the registry, when publishing got that far
    pub identifier: Option<String>,
    /// Failure or skip reason
    pub message: Option<String>,
    /// Processing time in milliseconds
    pub duration_ms: u64,
}

/// Aggregate report for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Execution timestamp
    pub timestamp: String,
    pub mode: RunMode,
    /// Registry the examples were published to
    pub registry_url: String,
    /// Examples extracted from the documentation
    pub total: usize,
    pub verified: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Per-example outcomes in document order
    pub examples: Vec<ExampleReport>,
}

impl RunReport {
    /// Create an empty report for `total` examples
    pub fn new(mode: RunMode, registry_url: impl Into<String>, total: usize) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode,
            registry_url: registry_url.into(),
            total,
            verified: 0,
            skipped: 0,
            failed: 0,
            examples: Vec::new(),
        }
    }

    /// Record an example outcome
    pub fn add(&mut self, example: ExampleReport) {
        match example.status {
            ExampleStatus::Verified => self.verified += 1,
            ExampleStatus::Skipped => self.skipped += 1,
            ExampleStatus::Failed => self.failed += 1,
        }
        self.examples.push(example);
    }

    /// Whether every extracted example was verified
    pub fn is_complete(&self) -> bool {
        self.verified == self.total
    }

    /// One-line summary, e.g. `verified 3/4 examples`
    pub fn summary(&self) -> String {
        format!("verified {}/{} examples", self.verified, self.total)
    }

    /// Fail with [`RoundtripError::Incomplete`] unless every example was verified
    pub fn ensure_complete(&self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(RoundtripError::Incomplete {
                verified: self.verified,
                total: self.total,
            })
        }
    }

    /// Generate markdown report
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# Example Round-Trip Report\n\n");
        md.push_str(&format!("**Generated**: {}\n\n", self.timestamp));
        md.push_str(&format!("**Registry**: {}\n", self.registry_url));
        md.push_str(&format!("**Mode**: {}\n\n", self.mode));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Examples**: {}\n", self.total));
        md.push_str(&format!("- **Verified**: {} ✅\n", self.verified));
        md.push_str(&format!("- **Skipped**: {} ⚠️\n", self.skipped));
        md.push_str(&format!("- **Failed**: {} ⛔\n\n", self.failed));

        md.push_str("## Examples\n\n");
        md.push_str("| Line | Status | ID | Duration (ms) |\n");
        md.push_str("|------|--------|----|---------------|\n");
        for example in &self.examples {
            let status = match example.status {
                ExampleStatus::Verified => "✅ verified",
                ExampleStatus::Skipped => "⚠️ skipped",
                ExampleStatus::Failed => "⛔ failed",
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                example.line,
                status,
                example.identifier.as_deref().unwrap_or("-"),
                example.duration_ms
            ));
        }

        let problems: Vec<_> = self
            .examples
            .iter()
            .filter(|e| e.status != ExampleStatus::Verified)
            .collect();
        if !problems.is_empty() {
            md.push_str("\n## Problems\n\n");
            for example in problems {
                md.push_str(&format!("### Line {}\n\n", example.line));
                md.push_str("```\n");
                md.push_str(example.message.as_deref().unwrap_or("(no details)"));
                md.push_str("\n```\n\n");
            }
        }

        md
    }

    /// Save `roundtrip_report.json` and `roundtrip_report.md` into `output_dir`
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| RoundtripError::io_error(output_dir, e))?;

        let json_path = output_dir.join("roundtrip_report.json");
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            RoundtripError::internal_error(format!("Failed to serialize report: {e}"))
        })?;
        std::fs::write(&json_path, json).map_err(|e| RoundtripError::io_error(&json_path, e))?;

        let md_path = output_dir.join("roundtrip_report.md");
        std::fs::write(&md_path, self.to_markdown())
            .map_err(|e| RoundtripError::io_error(&md_path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn example(line: usize, status: ExampleStatus) -> ExampleReport {
        ExampleReport {
            line,
            status,
            identifier: (status == ExampleStatus::Verified).then(|| format!("id-{line}")),
            message: (status != ExampleStatus::Verified).then(|| "boom".to_string()),
            duration_ms: 5,
        }
    }

    #[test]
    fn test_counts_and_completeness() {
        let mut report = RunReport::new(RunMode::KeepGoing, "http://localhost:8080", 3);
        report.add(example(3, ExampleStatus::Verified));
        report.add(example(10, ExampleStatus::Skipped));
        report.add(example(20, ExampleStatus::Failed));

        assert_eq!(report.verified, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.is_complete());
        assert_eq!(report.summary(), "verified 1/3 examples");
        assert!(matches!(
            report.ensure_complete(),
            Err(RoundtripError::Incomplete {
                verified: 1,
                total: 3
            })
        ));
    }

    #[test]
    fn test_empty_run_is_complete() {
        let report = RunReport::new(RunMode::FailFast, "http://localhost:8080", 0);
        assert!(report.is_complete());
        assert!(report.ensure_complete().is_ok());
    }

    #[test]
    fn test_markdown_lists_problems() {
        let mut report = RunReport::new(RunMode::KeepGoing, "http://localhost:8080", 2);
        report.add(example(3, ExampleStatus::Verified));
        report.add(example(20, ExampleStatus::Failed));

        let md = report.to_markdown();
        assert!(md.contains("**Mode**: keep-going"));
        assert!(md.contains("| 3 | ✅ verified | id-3 | 5 |"));
        assert!(md.contains("| 20 | ⛔ failed | - | 5 |"));
        assert!(md.contains("### Line 20"));
        assert!(!md.contains("### Line 3\n"));
    }

    #[test]
    fn test_save_writes_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("reports");
        let mut report = RunReport::new(RunMode::FailFast, "http://localhost:8080", 1);
        report.add(example(3, ExampleStatus::Verified));
        report.save(&out).unwrap();

        let json = std::fs::read_to_string(out.join("roundtrip_report.json")).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.verified, 1);
        assert_eq!(parsed.examples[0].status, ExampleStatus::Verified);
        assert!(out.join("roundtrip_report.md").exists());
    }
}
