//! The commented-document layer: turning stored text into an object graph
//! and a record back into text.
//!
//! Parsing goes through a JSON5 parser, which accepts `//` and `/* */`
//! comments and trailing commas on top of plain JSON. Comments are a text
//! concern only; they never reach validation or merging.

use std::path::Path;

use serde_json::{Map, Value};

use crate::annotate::annotate;
use crate::error::{ConfigResult, DocumentError};
use crate::types::ConfigRecord;

/// Maximum accepted document size (1 MiB).
pub const MAX_DOCUMENT_SIZE: u64 = 1_048_576;

/// Stored text flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON with comments; written with section banners.
    #[default]
    Jsonc,
    /// Plain JSON; written without comments.
    Json,
}

impl ConfigFormat {
    /// Pick the format from a path's extension. Anything but `.json` is JSONC.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Jsonc,
        }
    }
}

/// Parse stored text into a non-empty object.
///
/// # Errors
///
/// Returns [`DocumentError::Empty`] for blank text or `{}`, and the other
/// variants for oversized, malformed, or non-object documents.
pub fn parse_document(text: &str) -> Result<Map<String, Value>, DocumentError> {
    let size = text.len() as u64;
    if size > MAX_DOCUMENT_SIZE {
        return Err(DocumentError::TooLarge {
            size,
            limit: MAX_DOCUMENT_SIZE,
        });
    }

    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }

    let value: Value = json5::from_str(text).map_err(|e| DocumentError::Syntax(e.to_string()))?;
    match value {
        Value::Object(map) if map.is_empty() => Err(DocumentError::Empty),
        Value::Object(map) => Ok(map),
        other => Err(DocumentError::NotAnObject(kind_name(&other))),
    }
}

/// Serialize a record for storage in `format`.
///
/// # Errors
///
/// Returns [`crate::ConfigError::Serialize`] if serialization fails.
pub fn render_record(record: &ConfigRecord, format: ConfigFormat) -> ConfigResult<String> {
    let text = serde_json::to_string_pretty(record)?;
    Ok(match format {
        ConfigFormat::Jsonc => annotate(&text),
        ConfigFormat::Json => format!("{}\n", text.trim_end()),
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
