//! Logging setup shared by the projconf binaries.
//!
//! # Example
//!
//! ```rust,no_run
//! use projconf_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), projconf_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("projconf_config=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, level_for_verbosity,
    setup_logging,
};
