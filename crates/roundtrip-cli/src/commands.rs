//! Command implementations

use anyhow::Context;
use colored::Colorize;
use roundtrip_core::{
    ConfigLoader, PublishOrchestrator, RoundtripConfig, RunOutcome, load_examples,
};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

use crate::output::{print_summary, progress_callback};

/// Command-line values that take precedence over the config file
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub examples: Option<PathBuf>,
    pub publisher: Option<PathBuf>,
    pub registry_url: Option<String>,
    pub publish_timeout_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
    pub grace_period_ms: Option<u64>,
    pub artifact_dir: Option<PathBuf>,
    pub id_pattern: Option<String>,
    pub keep_going: bool,
    pub report_dir: Option<PathBuf>,
}

impl RunOverrides {
    fn apply(self, config: &mut RoundtripConfig) {
        if let Some(examples) = self.examples {
            config.examples_path = examples;
        }
        if let Some(publisher) = self.publisher {
            config.publisher = publisher;
        }
        if let Some(registry_url) = self.registry_url {
            config.registry_url = registry_url;
        }
        if let Some(ms) = self.publish_timeout_ms {
            config.publish_timeout_ms = ms;
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config.fetch_timeout_ms = ms;
        }
        if let Some(ms) = self.grace_period_ms {
            config.grace_period_ms = ms;
        }
        if let Some(dir) = self.artifact_dir {
            config.artifact_dir = Some(dir);
        }
        if let Some(pattern) = self.id_pattern {
            config.id_pattern = pattern;
        }
        if self.keep_going {
            config.keep_going = true;
        }
        if let Some(dir) = self.report_dir {
            config.report_dir = Some(dir);
        }
    }
}

/// Publish, fetch, and compare every example
pub async fn run_command(overrides: RunOverrides, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = ConfigLoader::load(config_path.as_deref(), None)?;
    overrides.apply(&mut config);
    config.validate()?;
    debug!("Resolved configuration: {:?}", config);

    let examples = load_examples(&config.examples_path)?;
    let orchestrator =
        PublishOrchestrator::from_config(&config)?.with_progress_callback(progress_callback());
    println!(
        "Found {} examples in {} ({})\n",
        examples.len(),
        config.examples_path.display(),
        orchestrator.mode()
    );

    let RunOutcome { report, error } = orchestrator.run_with_report(&examples).await;
    print_summary(&report);

    if let Some(dir) = &config.report_dir {
        let saved = report
            .save(dir)
            .with_context(|| format!("failed to write report to {}", dir.display()));
        match saved {
            Ok(()) => println!("📄 Reports saved to: {}", dir.display()),
            // The run's own error is the one to surface.
            Err(e) if error.is_some() => eprintln!("{} {:#}", "⚠️".yellow(), e),
            Err(e) => return Err(e),
        }
    }

    if let Some(e) = error {
        return Err(e.into());
    }
    report.ensure_complete()?;
    Ok(())
}

/// Print the examples found in a documentation file
pub fn list_command(path: Option<PathBuf>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => ConfigLoader::load(config_path.as_deref(), None)?.examples_path,
    };

    let examples = load_examples(&path)?;
    println!("Found {} examples in {}", examples.len(), path.display());

    for example in &examples {
        match serde_json::from_slice::<Map<String, Value>>(&example.content) {
            Ok(fields) => {
                let name = fields
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("(unnamed)");
                println!(
                    "  {} line {}: {} ({} fields)",
                    "✅".green(),
                    example.line,
                    name,
                    fields.len()
                );
            }
            Err(e) => {
                println!(
                    "  {} line {}: {}",
                    "⚠️".yellow(),
                    example.line,
                    format!("isn't a valid JSON object: {e}").yellow()
                );
            }
        }
    }

    Ok(())
}
