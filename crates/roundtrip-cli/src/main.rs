//! Roundtrip CLI
//!
//! Publishes the JSON examples found in documentation to a registry and checks
//! that the stored records match them.

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::RunOverrides;

#[derive(Parser)]
#[command(name = "roundtrip")]
#[command(about = "Verify that documented JSON examples round-trip through a registry")]
#[command(version = roundtrip_core::VERSION)]
#[command(
    long_about = "Publishes every ```json example in a documentation file with the publisher\n\
client, fetches the stored record back from the registry, and compares it with the example.\n\
\n\
Examples:\n  \
roundtrip run                                   # Use defaults or a discovered config file\n  \
roundtrip run --registry-url http://localhost:8080\n  \
roundtrip run --keep-going --report-dir reports # Report every example instead of stopping\n  \
roundtrip list docs/server-json/examples.md     # Show extracted examples"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.roundtriprc.json/.roundtriprc.toml/roundtrip.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish, fetch, and compare every documented example
    Run {
        /// Documentation file containing the examples
        #[arg(long, env = "ROUNDTRIP_EXAMPLES")]
        examples: Option<PathBuf>,

        /// Publisher executable
        #[arg(long, env = "ROUNDTRIP_PUBLISHER")]
        publisher: Option<PathBuf>,

        /// Registry base URL
        #[arg(long, env = "ROUNDTRIP_REGISTRY_URL")]
        registry_url: Option<String>,

        /// Deadline for each publish invocation, in milliseconds
        #[arg(long)]
        publish_timeout_ms: Option<u64>,

        /// Deadline for each registry read, in milliseconds
        #[arg(long)]
        fetch_timeout_ms: Option<u64>,

        /// Time a timed-out publisher gets to exit before it is killed, in milliseconds
        #[arg(long)]
        grace_period_ms: Option<u64>,

        /// Directory for temporary example files (default: system temp dir)
        #[arg(long)]
        artifact_dir: Option<PathBuf>,

        /// Pattern with one capture group matching the id in publisher output
        #[arg(long)]
        id_pattern: Option<String>,

        /// Continue after a failing example and report every outcome
        #[arg(long)]
        keep_going: bool,

        /// Write roundtrip_report.json and roundtrip_report.md to this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// List the examples found in a documentation file
    List {
        /// Documentation file (default: configured examples path)
        #[arg(help = "Documentation file to scan")]
        path: Option<PathBuf>,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version,
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let log_level = match cli.verbose {
        0 => "roundtrip=warn",
        1 => "roundtrip=info",
        2 => "roundtrip=debug",
        _ => "roundtrip=trace",
    };
    // No other threads exist yet.
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    roundtrip_core::init_tracing();

    // Examples are processed sequentially; one thread is enough.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} failed to create Tokio runtime: {}", "⛔".red(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_command(cli)) {
        eprintln!("{} {}", "⛔".red(), e.to_string().red());
        std::process::exit(1);
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Run {
            examples,
            publisher,
            registry_url,
            publish_timeout_ms,
            fetch_timeout_ms,
            grace_period_ms,
            artifact_dir,
            id_pattern,
            keep_going,
            report_dir,
        }) => {
            let overrides = RunOverrides {
                examples,
                publisher,
                registry_url,
                publish_timeout_ms,
                fetch_timeout_ms,
                grace_period_ms,
                artifact_dir,
                id_pattern,
                keep_going,
                report_dir,
            };
            commands::run_command(overrides, cli.config).await
        }

        Some(Commands::List { path }) => commands::list_command(path, cli.config),

        Some(Commands::Version) => {
            println!("roundtrip {}", roundtrip_core::VERSION);
            Ok(())
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
