//! projconf CLI - inspect, check, and repair a project's configuration file.
//!
//! Every command resolves the config path against `--root`, probes the
//! project there for defaults, and goes through the same read ladder as the
//! library, so running any command also heals a damaged file.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use projconf_config::{ProjectContext, ProjectProbe};
use projconf_telemetry::{LogConfig, LogFormat, level_for_verbosity, setup_logging};

mod commands;
mod theme;

use commands::config;

/// projconf - project configuration engine
#[derive(Parser)]
#[command(name = "projconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project root used for detection and relative paths
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file, relative to the project root unless absolute
    #[arg(short, long, global = true, default_value = "projconf.jsonc")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogStyle::Compact)]
    log_format: LogStyle,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogStyle {
    Pretty,
    Compact,
    Json,
}

impl From<LogStyle> for LogFormat {
    fn from(style: LogStyle) -> Self {
        match style {
            LogStyle::Pretty => Self::Pretty,
            LogStyle::Compact => Self::Compact,
            LogStyle::Json => Self::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the configuration, or one dotted key of it
    Show {
        /// Dotted key, e.g. `codeStyle.lineWidth`
        key: Option<String>,

        /// Print plain JSON without comment banners
        #[arg(long)]
        json: bool,
    },

    /// Validate the stored file without modifying it
    Check,

    /// Load the configuration, repairing it if needed, and report what happened
    Repair,

    /// Set one dotted key and persist the result
    Set {
        /// Dotted key, e.g. `features.docker`
        key: String,

        /// New value, parsed as JSON and falling back to a plain string
        value: String,
    },

    /// Create the configuration file from project defaults
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Reconcile with current project defaults if the revalidation window has elapsed
    Revalidate,
}

/// Resolve `config` against `root` unless it is already absolute.
fn resolve_config_path(root: &Path, config: &Path) -> PathBuf {
    if config.is_absolute() {
        config.to_path_buf()
    } else {
        root.join(config)
    }
}

async fn project_context(root: &Path) -> Result<ProjectContext> {
    ProjectProbe::new(root)
        .context()
        .await
        .with_context(|| format!("failed to inspect project at {}", root.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::new(level_for_verbosity(cli.verbose))
        .with_format(cli.log_format.into())
        .without_timestamps();
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let path = resolve_config_path(&cli.root, &cli.config);

    match cli.command {
        Commands::Check => config::check_config(&path).await?,
        Commands::Show { key, json } => {
            let ctx = project_context(&cli.root).await?;
            config::show_config(&path, &ctx, key.as_deref(), json).await?;
        },
        Commands::Repair => {
            let ctx = project_context(&cli.root).await?;
            config::repair_config(&path, &ctx).await?;
        },
        Commands::Set { key, value } => {
            let ctx = project_context(&cli.root).await?;
            config::set_value(&path, &ctx, &key, &value).await?;
        },
        Commands::Init { force } => {
            let ctx = project_context(&cli.root).await?;
            config::init_config(&path, &ctx, force).await?;
        },
        Commands::Revalidate => {
            let ctx = project_context(&cli.root).await?;
            config::revalidate(&path, &ctx).await?;
        },
    }

    Ok(())
}
