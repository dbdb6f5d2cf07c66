//! CLI styling.
//!
//! Recovery notices from the read path print as warnings, `check` lists its
//! issues under an error line, and successful writes print a check mark.

use colored::Colorize;

/// Message styles.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format one bullet of `check` output.
    pub(crate) fn issue(text: &str) -> String {
        format!("  {} {}", "-".dimmed(), text)
    }
}
