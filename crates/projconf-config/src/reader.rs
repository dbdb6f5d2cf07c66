//! Loading with recovery.
//!
//! The reader never fails because of what is *in* the file. Each rung of the
//! ladder is tried in order until one yields a valid record:
//!
//! | stored state                          | result                 |
//! |---------------------------------------|------------------------|
//! | absent, valid backup present          | [`RecoveryOutcome::RestoredFromBackup`] |
//! | absent / empty / `{}`                 | [`RecoveryOutcome::Created`] |
//! | valid                                 | [`RecoveryOutcome::Loaded`] |
//! | only required fields missing          | [`RecoveryOutcome::Merged`] |
//! | invalid or unparseable, valid backup  | [`RecoveryOutcome::RestoredFromBackup`] |
//! | invalid, some fields salvageable      | [`RecoveryOutcome::Repaired`] |
//! | nothing usable                        | [`RecoveryOutcome::Regenerated`] |
//!
//! Only I/O failures are returned as errors.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::context::ProjectContext;
use crate::defaults::build_defaults;
use crate::document::{ConfigFormat, MAX_DOCUMENT_SIZE, parse_document};
use crate::error::{ConfigError, ConfigResult, DocumentError, summarize};
use crate::merge::{reconcile, salvageable};
use crate::types::ConfigRecord;
use crate::validate::{only_missing_fields, validate};
use crate::writer::{backup_path, remove_if_exists, temp_path, write};

/// How a record was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The stored file was valid and returned untouched.
    Loaded,
    /// No usable file existed; defaults were written.
    Created,
    /// Missing fields were filled from defaults.
    Merged {
        /// Paths of the filled fields.
        filled: Vec<String>,
    },
    /// The stored file was unusable and the backup replaced it.
    RestoredFromBackup,
    /// Invalid fields were replaced from defaults; valid ones were kept.
    Repaired {
        /// Paths of replaced fields.
        replaced: Vec<String>,
        /// Paths of filled fields.
        filled: Vec<String>,
    },
    /// Nothing was salvageable; the file was rebuilt from defaults.
    Regenerated {
        /// Why the stored file was discarded.
        reason: String,
    },
}

impl RecoveryOutcome {
    /// User-facing notice for outcomes that changed a file the user owns.
    ///
    /// `None` for [`Loaded`](Self::Loaded) and [`Created`](Self::Created).
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Loaded | Self::Created => None,
            Self::Merged { filled } => Some(format!(
                "Config repaired: added {} missing field(s) with default values",
                filled.len()
            )),
            Self::RestoredFromBackup => {
                Some("Config repaired: restored the last good copy from backup".to_owned())
            },
            Self::Repaired { replaced, filled } => Some(format!(
                "Config repaired: replaced {} invalid and added {} missing field(s)",
                replaced.len(),
                filled.len()
            )),
            Self::Regenerated { reason } => {
                Some(format!("Config regenerated from defaults ({reason})"))
            },
        }
    }

    /// Whether the outcome went past a plain load or first-run creation.
    #[must_use]
    pub fn is_recovery(&self) -> bool {
        !matches!(self, Self::Loaded | Self::Created)
    }
}

impl fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => f.write_str("loaded"),
            Self::Created => f.write_str("created from defaults"),
            Self::Merged { .. } => f.write_str("merged missing fields"),
            Self::RestoredFromBackup => f.write_str("restored from backup"),
            Self::Repaired { .. } => f.write_str("repaired invalid fields"),
            Self::Regenerated { .. } => f.write_str("regenerated"),
        }
    }
}

/// A record together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    /// The valid record.
    pub record: ConfigRecord,
    /// Which rung of the ladder produced it.
    pub outcome: RecoveryOutcome,
}

impl LoadedConfig {
    fn new(record: ConfigRecord, outcome: RecoveryOutcome) -> Self {
        Self { record, outcome }
    }
}

enum Stored {
    Absent,
    Unusable(DocumentError),
    Parsed(Map<String, Value>),
}

/// Load the record at `path`, recovering from anything short of an I/O error.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file or its siblings cannot be read,
/// written, or renamed.
pub async fn read(path: &Path, ctx: &ProjectContext) -> ConfigResult<LoadedConfig> {
    let format = ConfigFormat::from_path(path);
    let backup = backup_path(path);
    remove_if_exists(&temp_path(path)).await;

    let map = match load(path).await? {
        Stored::Absent => {
            if let Some(record) = restore_backup(path, &backup).await? {
                return Ok(LoadedConfig::new(record, RecoveryOutcome::RestoredFromBackup));
            }
            debug!(path = %path.display(), "No config found; creating from defaults");
            return create(path, ctx, format).await;
        },
        Stored::Unusable(DocumentError::Empty) => {
            debug!(path = %path.display(), "Config is empty; creating from defaults");
            return create(path, ctx, format).await;
        },
        Stored::Unusable(e) => {
            warn!(path = %path.display(), error = %e, "Config could not be parsed");
            if let Some(record) = restore_backup(path, &backup).await? {
                return Ok(LoadedConfig::new(record, RecoveryOutcome::RestoredFromBackup));
            }
            return regenerate(path, ctx, format, e.to_string()).await;
        },
        Stored::Parsed(map) => map,
    };

    let value = Value::Object(map);
    let issues = match validate(&value) {
        Ok(record) => {
            remove_if_exists(&backup).await;
            debug!(path = %path.display(), "Config loaded");
            return Ok(LoadedConfig::new(record, RecoveryOutcome::Loaded));
        },
        Err(issues) => issues,
    };

    if only_missing_fields(&issues) {
        let merged = reconcile(&value, &build_defaults(ctx));
        write(path, &merged.record, format).await?;
        info!(
            path = %path.display(),
            filled = ?merged.filled,
            "Filled missing config fields from defaults"
        );
        return Ok(LoadedConfig::new(
            merged.record,
            RecoveryOutcome::Merged {
                filled: merged.filled,
            },
        ));
    }

    warn!(
        path = %path.display(),
        issues = %summarize(&issues),
        "Config failed validation"
    );
    if let Some(record) = restore_backup(path, &backup).await? {
        return Ok(LoadedConfig::new(record, RecoveryOutcome::RestoredFromBackup));
    }

    let salvage = value.as_object().is_some_and(salvageable);
    if !salvage {
        return regenerate(
            path,
            ctx,
            format,
            format!("{} invalid field(s), none usable", issues.len()),
        )
        .await;
    }

    let repaired = reconcile(&value, &build_defaults(ctx));
    write(path, &repaired.record, format).await?;
    info!(
        path = %path.display(),
        replaced = ?repaired.replaced,
        filled = ?repaired.filled,
        dropped = ?repaired.dropped,
        "Repaired config from defaults"
    );
    Ok(LoadedConfig::new(
        repaired.record,
        RecoveryOutcome::Repaired {
            replaced: repaired.replaced,
            filled: repaired.filled,
        },
    ))
}

async fn load(path: &Path) -> ConfigResult<Stored> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Stored::Absent),
        Err(e) => return Err(ConfigError::io(path, "inspect the config", e)),
    };
    if metadata.len() > MAX_DOCUMENT_SIZE {
        return Ok(Stored::Unusable(DocumentError::TooLarge {
            size: metadata.len(),
            limit: MAX_DOCUMENT_SIZE,
        }));
    }

    let bytes = fs::read(path)
        .await
        .map_err(|e| ConfigError::io(path, "read the config", e))?;
    let parsed = String::from_utf8(bytes)
        .map_err(|e| DocumentError::Syntax(format!("invalid UTF-8: {e}")))
        .and_then(|text| parse_document(&text));

    Ok(match parsed {
        Ok(map) => Stored::Parsed(map),
        Err(e) => Stored::Unusable(e),
    })
}

/// Move a valid backup over the primary. An unusable backup is deleted.
async fn restore_backup(path: &Path, backup: &Path) -> ConfigResult<Option<ConfigRecord>> {
    let reason = match load(backup).await? {
        Stored::Absent => return Ok(None),
        Stored::Unusable(e) => e.to_string(),
        Stored::Parsed(map) => match validate(&Value::Object(map)) {
            Ok(record) => {
                fs::rename(backup, path)
                    .await
                    .map_err(|e| ConfigError::io(backup, "restore the backup", e))?;
                info!(path = %path.display(), "Restored config from backup");
                return Ok(Some(record));
            },
            Err(issues) => summarize(&issues),
        },
    };

    warn!(backup = %backup.display(), reason = %reason, "Backup is unusable; discarding it");
    remove_if_exists(backup).await;
    Ok(None)
}

async fn create(
    path: &Path,
    ctx: &ProjectContext,
    format: ConfigFormat,
) -> ConfigResult<LoadedConfig> {
    let record = build_defaults(ctx);
    write(path, &record, format).await?;
    info!(path = %path.display(), "Created config from project defaults");
    Ok(LoadedConfig::new(record, RecoveryOutcome::Created))
}

async fn regenerate(
    path: &Path,
    ctx: &ProjectContext,
    format: ConfigFormat,
    reason: String,
) -> ConfigResult<LoadedConfig> {
    warn!(path = %path.display(), reason = %reason, "Discarding config and regenerating defaults");
    remove_if_exists(path).await;
    let record = build_defaults(ctx);
    write(path, &record, format).await?;
    Ok(LoadedConfig::new(
        record,
        RecoveryOutcome::Regenerated { reason },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_only_for_recoveries() {
        assert!(RecoveryOutcome::Loaded.message().is_none());
        assert!(RecoveryOutcome::Created.message().is_none());

        let merged = RecoveryOutcome::Merged {
            filled: vec!["monorepo".to_owned()],
        };
        assert!(merged.message().unwrap().contains("repaired"));
        assert!(merged.is_recovery());

        let regenerated = RecoveryOutcome::Regenerated {
            reason: "syntax error".to_owned(),
        };
        let msg = regenerated.message().unwrap();
        assert!(msg.contains("regenerated"));
        assert!(msg.contains("syntax error"));
    }

    #[tokio::test]
    async fn test_stale_temp_removed_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projconf.jsonc");
        std::fs::write(temp_path(&path), "half-written").unwrap();

        let loaded = read(&path, &ProjectContext::default()).await.unwrap();

        assert_eq!(loaded.outcome, RecoveryOutcome::Created);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_oversized_file_treated_as_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projconf.jsonc");
        let huge = format!("{{\"projectName\": \"{}\"}}", "x".repeat(1_100_000));
        std::fs::write(&path, huge).unwrap();

        let loaded = read(&path, &ProjectContext::default()).await.unwrap();

        assert!(matches!(
            loaded.outcome,
            RecoveryOutcome::Regenerated { .. }
        ));
        assert!(std::fs::metadata(&path).unwrap().len() < MAX_DOCUMENT_SIZE);
    }

    #[tokio::test]
    async fn test_invalid_utf8_treated_as_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projconf.jsonc");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let loaded = read(&path, &ProjectContext::default()).await.unwrap();

        assert!(matches!(
            loaded.outcome,
            RecoveryOutcome::Regenerated { .. }
        ));
    }

    #[tokio::test]
    async fn test_directory_at_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projconf.jsonc");
        std::fs::create_dir(&path).unwrap();

        let err = read(&path, &ProjectContext::default()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
