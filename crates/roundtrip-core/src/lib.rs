//! Roundtrip Core
//!
//! Verifies that JSON examples documented in Markdown survive a round trip
//! through a registry: each example is published with an external client,
//! fetched back by the identifier the registry assigned, and compared field
//! by field against the documented example.

pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod identifier;
pub mod orchestrator;
pub mod publisher;
pub mod registry;
pub mod report;
pub mod result;

pub use compare::{Mismatch, MismatchReason, compare, compare_fields, is_zero};
pub use config::{ConfigLoader, RoundtripConfig};
pub use error::{ErrorKind, RoundtripError};
pub use extract::{Example, extract_examples, load_examples};
pub use identifier::{IdentifierExtractor, PatternIdentifierExtractor};
pub use orchestrator::{
    ProgressCallback, ProgressEvent, PublishOrchestrator, RunMode, RunOutcome,
};
pub use publisher::{ProcessPublisher, PublishOutput, Publisher};
pub use registry::{HttpRegistry, Registry};
pub use report::{ExampleReport, ExampleStatus, RunReport};
pub use result::Result;

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roundtrip=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
