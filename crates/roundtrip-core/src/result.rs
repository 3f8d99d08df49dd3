//! Result type alias for round-trip operations

use crate::error::RoundtripError;

/// Result type for round-trip operations
pub type Result<T> = std::result::Result<T, RoundtripError>;
