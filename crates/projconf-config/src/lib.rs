#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Persistence, recovery, and reconciliation for the projconf project
//! configuration file.
//!
//! The engine owns one record per project, stored as JSON with comments
//! (`projconf.jsonc` by default). It guarantees that a caller asking for the
//! record always receives a valid one: missing fields are filled, invalid
//! fields are replaced, a corrupt file falls back to its backup, and when
//! nothing is usable the record is regenerated from project defaults.
//!
//! # Usage
//!
//! ```rust,no_run
//! use projconf_config::{ProjectProbe, store};
//!
//! # async fn run() -> projconf_config::ConfigResult<()> {
//! let probe = ProjectProbe::new(".");
//! let ctx = probe.context().await?;
//! let path = std::path::Path::new("projconf.jsonc");
//!
//! let loaded = store::read_config_detailed(path, &ctx).await?;
//! if let Some(notice) = loaded.outcome.message() {
//!     eprintln!("{notice}");
//! }
//!
//! let applied = store::update_config(
//!     path,
//!     &serde_json::json!({ "codeStyle": { "lineWidth": 100 } }),
//!     &ctx,
//! )
//! .await?;
//! assert!(applied);
//! # Ok(())
//! # }
//! ```
//!
//! # Writes
//!
//! Every write validates first, then goes through a backup, a synced temp
//! file, and a rename, so the file at the primary path is always either the
//! previous or the new complete document.

/// Comment banners for stored documents.
pub mod annotate;
/// Project inspection that feeds the defaults.
pub mod context;
/// Default record construction.
pub mod defaults;
/// Parsing and rendering of stored text.
pub mod document;
/// Engine error types.
pub mod error;
/// Reconciliation of stored documents with defaults.
pub mod merge;
/// Loading with recovery.
pub mod reader;
/// Revalidation scheduling.
pub mod revalidate;
/// Field table the validator and merger walk.
pub mod schema;
/// Public entry points.
pub mod store;
/// Record and enum definitions.
pub mod types;
/// Structural validation.
pub mod validate;
/// Atomic persistence.
pub mod writer;

// Re-export primary types at the crate root.
pub use context::{ProjectContext, ProjectProbe};
pub use defaults::build_defaults;
pub use document::ConfigFormat;
pub use error::{ConfigError, ConfigResult, DocumentError};
pub use reader::{LoadedConfig, RecoveryOutcome};
pub use revalidate::{needs_revalidation, needs_revalidation_at};
pub use types::*;
pub use validate::{IssueKind, ValidationIssue, validate};
