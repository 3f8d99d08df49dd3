//! Error types and classification for round-trip verification

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::compare::Mismatch;

/// Main error type for round-trip verification
#[derive(Debug, Error)]
pub enum RoundtripError {
    /// The documentation source does not exist
    #[error("{} not found; run this from the repository root or pass --examples", path.display())]
    DocumentNotFound { path: PathBuf },

    /// File system I/O errors
    #[error("IO error for path '{}': {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An example's content is not valid JSON
    #[error("example on line {line} isn't valid JSON: {source}")]
    InvalidExample {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The publishing client executable is missing or not executable
    #[error("publisher {} not found or not executable; build it before running", program.display())]
    PublisherNotFound {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The publishing client could not be started for another reason
    #[error("failed to start publisher {}: {source}", program.display())]
    PublisherSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The publishing client exited with a non-zero status
    #[error("publisher exited with {status}\n{output}")]
    PublishFailed { status: String, output: String },

    /// The publishing client did not finish before its deadline
    #[error("publisher timed out after {}ms\n{output}", timeout.as_millis())]
    PublishTimedOut { timeout: Duration, output: String },

    /// The publishing client succeeded but its output carried no identifier
    #[error("didn't find ID in publisher output\n{output}")]
    MissingIdentifier { output: String },

    /// The registry request could not be completed
    #[error("registry request to {url} failed: {source}")]
    RegistryRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered with a non-success status
    #[error("registry responded {status}: {body}")]
    RegistryStatus { status: u16, body: String },

    /// The registry response body is not a JSON document
    #[error("failed to decode registry response: {source}")]
    RegistryDecode {
        #[source]
        source: serde_json::Error,
    },

    /// A field of the fetched record does not match the example
    #[error("field \"{field}\": {mismatch}")]
    FieldMismatch { field: String, mismatch: Mismatch },

    /// A check failed while processing one example
    #[error("example on line {line}: {source}")]
    ExampleFailed {
        line: usize,
        #[source]
        source: Box<RoundtripError>,
    },

    /// Not every extracted example was verified
    #[error("verified {verified}/{total} examples")]
    Incomplete { verified: usize, total: usize },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Documentation source missing or unreadable
    Input,
    /// Example content is not JSON
    Decode,
    /// Publishing client unavailable
    Environment,
    /// Publishing client failed, timed out, or reported no identifier
    Invocation,
    /// Registry read failed or returned an undecodable body
    Protocol,
    /// Fetched record differs from the example
    Semantic,
    Config,
    Internal,
}

impl RoundtripError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoundtripError::DocumentNotFound { .. } | RoundtripError::IoError { .. } => {
                ErrorKind::Input
            }
            RoundtripError::InvalidExample { .. } => ErrorKind::Decode,
            RoundtripError::PublisherNotFound { .. } => ErrorKind::Environment,
            RoundtripError::PublisherSpawn { .. }
            | RoundtripError::PublishFailed { .. }
            | RoundtripError::PublishTimedOut { .. }
            | RoundtripError::MissingIdentifier { .. } => ErrorKind::Invocation,
            RoundtripError::RegistryRequest { .. }
            | RoundtripError::RegistryStatus { .. }
            | RoundtripError::RegistryDecode { .. } => ErrorKind::Protocol,
            RoundtripError::FieldMismatch { .. } => ErrorKind::Semantic,
            RoundtripError::ExampleFailed { source, .. } => source.kind(),
            RoundtripError::Incomplete { .. } => ErrorKind::Semantic,
            RoundtripError::ConfigError { .. } => ErrorKind::Config,
            RoundtripError::InternalError { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error is recoverable (processing continues with the next example)
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Decode
    }

    /// Check if this error aborts the run in every mode
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Input | ErrorKind::Environment | ErrorKind::Config | ErrorKind::Internal
        )
    }

    /// Attach the originating example's line to this error
    pub fn for_example(self, line: usize) -> Self {
        match self {
            err @ RoundtripError::ExampleFailed { .. } => err,
            err => RoundtripError::ExampleFailed {
                line,
                source: Box::new(err),
            },
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}
