//! Progress and summary output

use colored::Colorize;
use roundtrip_core::publisher::indent_output;
use roundtrip_core::{ProgressCallback, ProgressEvent, RunReport};
use std::sync::Arc;

/// Callback printing orchestrator progress as it happens
pub fn progress_callback() -> ProgressCallback {
    Arc::new(print_event)
}

fn print_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Started { index, total, line } => {
            println!(
                "{} example starting on line {} ({}/{})",
                "Publishing".bold(),
                line,
                index + 1,
                total
            );
        }
        ProgressEvent::Skipped { reason, .. } => {
            println!("  ⚠️  {}", reason.yellow());
        }
        ProgressEvent::Published { output, .. } => {
            println!("  ✅ publisher output:");
            let indented = indent_output(&output);
            if !indented.is_empty() {
                println!("  {}", indented.replace('\n', "\n  ").dimmed());
            }
        }
        ProgressEvent::Verified { identifier, .. } => {
            println!(
                "  ✅ {} (id {})\n",
                "registry response matches example".green(),
                identifier
            );
        }
        ProgressEvent::Failed { line, message } => {
            let first_line = message.lines().next().unwrap_or_default();
            println!("  ⛔ {} {}", format!("line {line}:").red(), first_line.red());
        }
    }
}

/// Final count line, with skipped and failed counts when incomplete
pub fn print_summary(report: &RunReport) {
    let line = report.summary();
    if report.is_complete() {
        println!("{}", line.green().bold());
    } else {
        let mut details = Vec::new();
        if report.skipped > 0 {
            details.push(format!("{} skipped", report.skipped));
        }
        if report.failed > 0 {
            details.push(format!("{} failed", report.failed));
        }
        if details.is_empty() {
            println!("{}", line.yellow().bold());
        } else {
            println!("{} ({})", line.yellow().bold(), details.join(", "));
        }
    }
}
