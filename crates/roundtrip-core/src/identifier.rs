//! Recovering the identifier a registry assigned to a published record
//!
//! The publishing client reports the identifier inside free-form output.
//! Callers depend on [`IdentifierExtractor`] only, so the lenient pattern
//! match can be replaced once the client emits a structured result.

use regex::Regex;

use crate::{Result, RoundtripError};

/// Default pattern: the first `"id": "<value>"` in the output
pub const DEFAULT_ID_PATTERN: &str = r#""id":\s*"([^"]+)""#;

/// Finds the assigned identifier in publisher output
pub trait IdentifierExtractor: Send + Sync {
    /// Returns `None` when the output carries no (non-empty) identifier
    fn extract(&self, output: &str) -> Option<String>;
}

/// Extracts the first capture group of a regular expression
#[derive(Debug, Clone)]
pub struct PatternIdentifierExtractor {
    pattern: Regex,
}

impl PatternIdentifierExtractor {
    /// Compile `pattern`; it must contain at least one capture group
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            RoundtripError::config_error(format!("Invalid id pattern '{pattern}': {e}"))
        })?;
        if pattern.captures_len() < 2 {
            return Err(RoundtripError::config_error(format!(
                "Id pattern '{pattern}' must contain a capture group"
            )));
        }
        Ok(Self { pattern })
    }
}

impl Default for PatternIdentifierExtractor {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_ID_PATTERN).unwrap(),
        }
    }
}

impl IdentifierExtractor for PatternIdentifierExtractor {
    fn extract(&self, output: &str) -> Option<String> {
        self.pattern
            .captures(output)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_id_from_log_output() {
        let output = "Publishing to http://localhost:8080...\n\
                      Server published: {\"server\": {\"id\": \"abc123\", \"name\": \"x\"}}\n";
        let extractor = PatternIdentifierExtractor::default();
        assert_eq!(extractor.extract(output).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_tolerates_whitespace_after_colon() {
        let extractor = PatternIdentifierExtractor::default();
        assert_eq!(
            extractor.extract("{\"id\":\"tight\"}").as_deref(),
            Some("tight")
        );
        assert_eq!(
            extractor.extract("\"id\":\n    \"spaced\"").as_deref(),
            Some("spaced")
        );
    }

    #[test]
    fn test_first_match_wins() {
        let extractor = PatternIdentifierExtractor::default();
        let output = "\"id\": \"first\"\n\"id\": \"second\"";
        assert_eq!(extractor.extract(output).as_deref(), Some("first"));
    }

    #[test]
    fn test_missing_or_empty_id() {
        let extractor = PatternIdentifierExtractor::default();
        assert_eq!(extractor.extract("published!"), None);
        assert_eq!(extractor.extract("\"id\": \"\""), None);
    }

    #[test]
    fn test_custom_pattern() {
        let extractor = PatternIdentifierExtractor::new(r"ID=(\S+)").unwrap();
        assert_eq!(extractor.extract("ok ID=xyz-1 done").as_deref(), Some("xyz-1"));
    }

    #[test]
    fn test_pattern_requires_capture_group() {
        assert!(PatternIdentifierExtractor::new(r"id").is_err());
        assert!(PatternIdentifierExtractor::new(r"(unclosed").is_err());
    }
}
