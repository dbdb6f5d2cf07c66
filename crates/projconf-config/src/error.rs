use std::io;
use thiserror::Error;

use crate::validate::ValidationIssue;

/// Engine error type.
///
/// Only conditions the engine cannot recover from locally surface here.
/// Parse and validation problems in stored files are handled by the recovery
/// ladder and never reach callers of [`crate::store::read_config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem operation failed (permissions, disk full, ...).
    #[error("I/O error on {path} while trying to {action}: {source}")]
    Io {
        /// Path the operation was acting on.
        path: String,
        /// Short verb phrase naming the failed operation.
        action: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Refused to persist a record that fails validation.
    #[error("refusing to write invalid config ({} issue(s)): {}", .issues.len(), summarize(.issues))]
    InvalidRecord {
        /// Every issue found in the record.
        issues: Vec<ValidationIssue>,
    },

    /// Serializing a record to text failed.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn io(path: &std::path::Path, action: &'static str, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            action,
            source,
        }
    }
}

pub(crate) fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for engine operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why stored text could not be turned into a config object.
///
/// Every variant is recoverable: the reader treats them like a missing file.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Empty, whitespace-only, or the degenerate `{}` document.
    #[error("document is empty")]
    Empty,

    /// The text is not valid JSON-with-comments.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The document parsed, but its root is not an object.
    #[error("expected an object at the document root, found {0}")]
    NotAnObject(&'static str),

    /// The file exceeds the size limit.
    #[error("document is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },
}
