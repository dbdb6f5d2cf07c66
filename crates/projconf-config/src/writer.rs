//! Atomic persistence of a config record.
//!
//! Protocol for `projconf.jsonc`:
//!
//! 1. copy the current file to `projconf.jsonc.backup`
//! 2. write `projconf.jsonc.tmp` and `fsync` it
//! 3. rename the temp file over the primary
//! 4. delete the backup
//!
//! A crash at any point leaves either the old or the new file at the primary
//! path, plus possibly a backup or temp sibling that the reader cleans up.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::document::{ConfigFormat, render_record};
use crate::error::{ConfigError, ConfigResult};
use crate::types::ConfigRecord;
use crate::validate::validate_record;

/// Sibling holding the previous contents during a write.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, ".backup")
}

/// Sibling the new contents are staged in before the rename.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Validate, serialize, and atomically persist `record` at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRecord`] without touching the disk if the
/// record fails validation, and [`ConfigError::Io`] if any filesystem step
/// fails. On I/O failure the previous file is left in place (or restored from
/// the backup if the primary went missing).
pub async fn write(path: &Path, record: &ConfigRecord, format: ConfigFormat) -> ConfigResult<()> {
    validate_record(record).map_err(|issues| ConfigError::InvalidRecord { issues })?;
    let text = render_record(record, format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::io(parent, "create the config directory", e))?;
    }

    let backup = backup_path(path);
    let had_primary = match fs::copy(path, &backup).await {
        Ok(_) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(ConfigError::io(path, "back up the config", e)),
    };

    let tmp = temp_path(path);
    if let Err(e) = stage_and_swap(path, &tmp, text.as_bytes()).await {
        remove_if_exists(&tmp).await;
        if had_primary {
            restore_if_damaged(path, &backup).await;
        }
        return Err(e);
    }

    remove_if_exists(&backup).await;
    debug!(path = %path.display(), bytes = text.len(), "Config written");
    Ok(())
}

async fn stage_and_swap(path: &Path, tmp: &Path, bytes: &[u8]) -> ConfigResult<()> {
    let mut file = fs::File::create(tmp)
        .await
        .map_err(|e| ConfigError::io(tmp, "create the temp file", e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| ConfigError::io(tmp, "write the temp file", e))?;
    // Flush to disk before the rename so a crash cannot leave a renamed but
    // empty primary.
    file.sync_all()
        .await
        .map_err(|e| ConfigError::io(tmp, "sync the temp file", e))?;
    drop(file);

    fs::rename(tmp, path)
        .await
        .map_err(|e| ConfigError::io(path, "replace the config", e))
}

/// Move the backup back over the primary if the primary is gone or cannot be
/// read. A readable primary makes the backup redundant, so it is removed.
async fn restore_if_damaged(path: &Path, backup: &Path) {
    if fs::read(path).await.is_ok() {
        remove_if_exists(backup).await;
        return;
    }
    match fs::rename(backup, path).await {
        Ok(()) => warn!(path = %path.display(), "Restored config from backup after failed write"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "Failed to restore config from backup"
        ),
    }
}

/// Remove a file, ignoring "not found". Other failures are logged.
pub(crate) async fn remove_if_exists(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed stale file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {},
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale file"),
    }
}
