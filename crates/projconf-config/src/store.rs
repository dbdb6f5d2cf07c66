//! Public entry points.
//!
//! Every mutation goes through [`crate::writer::write`], so each of these
//! leaves either the previous or the new record on disk.

use std::path::Path;

use chrono::{SubsecRound, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::ProjectContext;
use crate::defaults::build_defaults;
use crate::document::ConfigFormat;
use crate::error::{ConfigResult, summarize};
use crate::merge::{deep_merge, reconcile};
use crate::reader::{LoadedConfig, read};
use crate::revalidate::needs_revalidation;
use crate::types::ConfigRecord;
use crate::validate::validate;
use crate::writer::write;

/// Load the record at `path`, creating or repairing it as needed.
///
/// # Errors
///
/// Returns [`crate::ConfigError::Io`] on filesystem failure.
pub async fn read_config(path: &Path, ctx: &ProjectContext) -> ConfigResult<ConfigRecord> {
    read(path, ctx).await.map(|loaded| loaded.record)
}

/// Like [`read_config`], but also reports which recovery step produced the
/// record so callers can surface [`crate::RecoveryOutcome::message`].
///
/// # Errors
///
/// Returns [`crate::ConfigError::Io`] on filesystem failure.
pub async fn read_config_detailed(
    path: &Path,
    ctx: &ProjectContext,
) -> ConfigResult<LoadedConfig> {
    read(path, ctx).await
}

/// Persist a complete record.
///
/// # Errors
///
/// Returns [`crate::ConfigError::InvalidRecord`] if the record fails
/// validation, or [`crate::ConfigError::Io`] on filesystem failure.
pub async fn write_config(path: &Path, record: &ConfigRecord) -> ConfigResult<()> {
    write(path, record, ConfigFormat::from_path(path)).await
}

/// Deep-merge `partial_update` over the stored record and persist the result.
///
/// Returns `Ok(false)` without writing when the merged record would be
/// invalid or the update names keys the schema does not know.
///
/// # Errors
///
/// Returns [`crate::ConfigError::Io`] on filesystem failure.
pub async fn update_config(
    path: &Path,
    partial_update: &Value,
    ctx: &ProjectContext,
) -> ConfigResult<bool> {
    let current = read_config(path, ctx).await?;
    let mut merged = serde_json::to_value(&current)?;
    deep_merge(&mut merged, partial_update);

    let unknown = reconcile(&merged, &current).dropped;
    if !unknown.is_empty() {
        warn!(path = %path.display(), keys = ?unknown, "Rejected config update with unknown keys");
        return Ok(false);
    }

    let record = match validate(&merged) {
        Ok(record) => record,
        Err(issues) => {
            warn!(
                path = %path.display(),
                issues = %summarize(&issues),
                "Rejected invalid config update"
            );
            return Ok(false);
        },
    };

    if record == current {
        debug!(path = %path.display(), "Config update is a no-op");
        return Ok(true);
    }

    write(path, &record, ConfigFormat::from_path(path)).await?;
    info!(path = %path.display(), "Config updated");
    Ok(true)
}

/// Reconcile the stored record with freshly computed defaults if its
/// revalidation window has elapsed.
///
/// Stored values always win; the pass only adds what the current defaults
/// know about and the record lacks, then stamps `configLastRevalidate`.
///
/// # Errors
///
/// Returns [`crate::ConfigError::Io`] on filesystem failure.
pub async fn revalidate_config(path: &Path, ctx: &ProjectContext) -> ConfigResult<LoadedConfig> {
    let loaded = read(path, ctx).await?;
    let record = &loaded.record;
    if !needs_revalidation(
        record.config_last_revalidate,
        record.config_revalidate_frequency,
    ) {
        debug!(path = %path.display(), "Config revalidation not due");
        return Ok(loaded);
    }

    let stored = serde_json::to_value(record)?;
    let reconciled = reconcile(&stored, &build_defaults(ctx));
    let mut record = reconciled.record;
    record.config_last_revalidate = Some(Utc::now().trunc_subsecs(0));

    write(path, &record, ConfigFormat::from_path(path)).await?;
    info!(
        path = %path.display(),
        filled = ?reconciled.filled,
        "Config revalidated against current defaults"
    );
    Ok(LoadedConfig {
        record,
        outcome: loaded.outcome,
    })
}
