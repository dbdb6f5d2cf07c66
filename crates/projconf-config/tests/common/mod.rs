//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use projconf_config::document::parse_document;
use projconf_config::writer::{backup_path, temp_path};
use projconf_config::{ConfigRecord, ProjectContext, build_defaults};
use serde_json::Value;
use tempfile::TempDir;

/// A temp project directory with a config path inside it.
pub struct ConfigHarness {
    _dir: TempDir,
    pub path: PathBuf,
    pub ctx: ProjectContext,
}

impl ConfigHarness {
    pub fn new() -> Self {
        Self::with_context(ProjectContext::default())
    }

    pub fn with_context(ctx: ProjectContext) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projconf.jsonc");
        Self {
            _dir: dir,
            path,
            ctx,
        }
    }

    pub fn backup(&self) -> PathBuf {
        backup_path(&self.path)
    }

    pub fn tmp(&self) -> PathBuf {
        temp_path(&self.path)
    }

    pub fn defaults(&self) -> ConfigRecord {
        build_defaults(&self.ctx)
    }

    pub fn write_primary(&self, text: &str) {
        std::fs::write(&self.path, text).unwrap();
    }

    pub fn write_backup(&self, text: &str) {
        std::fs::write(self.backup(), text).unwrap();
    }

    pub fn read_primary(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap()
    }

    /// Parsed contents of the primary file.
    pub fn stored(&self) -> Value {
        Value::Object(parse_document(&self.read_primary()).unwrap())
    }
}

/// JSON text of `record`.
pub fn to_text(record: &ConfigRecord) -> String {
    serde_json::to_string_pretty(record).unwrap()
}
