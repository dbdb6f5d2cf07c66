//! CLI handlers for the config commands.

use std::path::Path;

use anyhow::{Result, bail};
use projconf_config::document::{parse_document, render_record};
use projconf_config::merge::{get_nested, nested_overlay};
use projconf_config::store::{
    read_config_detailed, revalidate_config, update_config, write_config,
};
use projconf_config::{ConfigFormat, DocumentError, ProjectContext, build_defaults, validate};
use serde_json::Value;

use crate::theme::Theme;

/// Print the configuration, or the value at one dotted key.
pub(crate) async fn show_config(
    path: &Path,
    ctx: &ProjectContext,
    key: Option<&str>,
    json: bool,
) -> Result<()> {
    let loaded = read_config_detailed(path, ctx).await?;
    if let Some(notice) = loaded.outcome.message() {
        eprintln!("{}", Theme::warning(&notice));
    }

    let Some(key) = key else {
        let format = if json {
            ConfigFormat::Json
        } else {
            ConfigFormat::from_path(path)
        };
        print!("{}", render_record(&loaded.record, format)?);
        return Ok(());
    };

    let value = serde_json::to_value(&loaded.record)?;
    match get_nested(&value, key) {
        Some(found) => println!("{}", serde_json::to_string_pretty(found)?),
        None => {
            eprintln!("{}", Theme::error(&format!("No such key: {key}")));
            std::process::exit(1);
        },
    }
    Ok(())
}

/// Validate the stored file without repairing it.
pub(crate) async fn check_config(path: &Path) -> Result<()> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!(
                "{}",
                Theme::error(&format!("Cannot read {}: {e}", path.display()))
            );
            std::process::exit(1);
        },
    };

    let issues = match parse_document(&text) {
        Ok(object) => match validate(&Value::Object(object)) {
            Ok(_) => Vec::new(),
            Err(issues) => issues.iter().map(ToString::to_string).collect(),
        },
        Err(DocumentError::Empty) => vec!["document is empty".to_owned()],
        Err(e) => vec![e.to_string()],
    };

    if issues.is_empty() {
        println!("{}", Theme::success("Configuration is valid."));
        return Ok(());
    }

    eprintln!(
        "{}",
        Theme::error(&format!("{} has problems:", path.display()))
    );
    for issue in &issues {
        eprintln!("{}", Theme::issue(issue));
    }
    eprintln!(
        "{}",
        Theme::dimmed("Run `projconf repair` to fix them automatically.")
    );
    std::process::exit(1);
}

/// Load the configuration through the recovery ladder and report the step taken.
pub(crate) async fn repair_config(path: &Path, ctx: &ProjectContext) -> Result<()> {
    let loaded = read_config_detailed(path, ctx).await?;
    println!("{}", Theme::header(&path.display().to_string()));
    match loaded.outcome.message() {
        Some(notice) => println!("{}", Theme::warning(&notice)),
        None => println!("{}", Theme::success(&loaded.outcome.to_string())),
    }
    Ok(())
}

/// Set a dotted key to a value and persist the result.
pub(crate) async fn set_value(
    path: &Path,
    ctx: &ProjectContext,
    key: &str,
    raw: &str,
) -> Result<()> {
    let update = nested_overlay(key, parse_value(raw));
    if update_config(path, &update, ctx).await? {
        println!("{}", Theme::success(&format!("Set {key}")));
        Ok(())
    } else {
        eprintln!(
            "{}",
            Theme::error(&format!("Rejected {key} = {raw}: the result would be invalid"))
        );
        eprintln!("{}", Theme::dimmed("Run with -v to see the reason."));
        std::process::exit(1);
    }
}

/// Create the configuration from project defaults.
pub(crate) async fn init_config(path: &Path, ctx: &ProjectContext, force: bool) -> Result<()> {
    if force {
        write_config(path, &build_defaults(ctx)).await?;
        println!(
            "{}",
            Theme::success(&format!("Wrote defaults to {}", path.display()))
        );
        return Ok(());
    }

    if tokio::fs::try_exists(path).await? {
        bail!(
            "{} already exists; use --force to overwrite it",
            path.display()
        );
    }

    read_config_detailed(path, ctx).await?;
    println!(
        "{}",
        Theme::success(&format!("Created {}", path.display()))
    );
    Ok(())
}

/// Run a revalidation pass if one is due.
pub(crate) async fn revalidate(path: &Path, ctx: &ProjectContext) -> Result<()> {
    let loaded = revalidate_config(path, ctx).await?;
    let record = &loaded.record;
    match record.config_last_revalidate {
        Some(stamp) => println!(
            "{} {}",
            Theme::success("Last revalidated"),
            Theme::dimmed(&format!(
                "{} (every {})",
                stamp.to_rfc3339(),
                record.config_revalidate_frequency.as_str()
            ))
        ),
        None => println!("{}", Theme::warning("Never revalidated")),
    }
    Ok(())
}

/// Parse a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
