//! Example extraction
//!
//! Scans documentation text for fenced code blocks tagged `json` and returns
//! their raw contents in document order. Extraction is purely syntactic: a
//! block whose content is not valid JSON is still an example, and is rejected
//! later when the orchestrator decodes it.

use regex::bytes::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::{Result, RoundtripError};

/// Captures everything between a ```` ```json ```` opening fence and the next closing fence.
static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").unwrap());

/// One JSON document embedded in documentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Raw bytes between the fences
    pub content: Vec<u8>,
    /// 1-based line on which the block's content starts
    pub line: usize,
}

impl Example {
    /// Content as text, for messages
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Extract every fenced JSON block from `text`, in document order
pub fn extract_examples(text: &[u8]) -> Vec<Example> {
    JSON_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|content| Example {
            content: content.as_bytes().to_vec(),
            line: 1 + count_newlines(&text[..content.start()]),
        })
        .collect()
}

/// Read a documentation file and extract its examples
///
/// A missing file is reported as [`RoundtripError::DocumentNotFound`] so callers
/// can tell it apart from a file that exists but holds no examples.
pub fn load_examples(path: &Path) -> Result<Vec<Example>> {
    let text = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RoundtripError::DocumentNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RoundtripError::io_error(path, e)
        }
    })?;

    let examples = extract_examples(&text);
    tracing::debug!("Extracted {} examples from {}", examples.len(), path.display());
    Ok(examples)
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}
