//! Section banners for the stored JSONC document.
//!
//! Banners are placed on their own line directly above selected top-level
//! keys. Keys are located with a small brace-depth scanner that skips string
//! contents and comments, so a value that happens to contain `"features"` or
//! an unbalanced brace is never mistaken for structure.

use std::sync::LazyLock;

use regex::Regex;

/// Top-level key and the banner placed above it.
const BANNERS: &[(&str, &str)] = &[
    ("projectName", "// Project identity"),
    ("features", "// Project features"),
    ("preferredLibraries", "// Preferred libraries per capability"),
    ("codeStyle", "// Code style preferences"),
    ("gitBehavior", "// Automation behavior (prompt | autoYes | autoNo)"),
    ("ignoreDependencies", "// Dependency governance"),
    ("customRules", "// Custom rules"),
];

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("invalid regex"));

/// Insert section banners into serialized record text.
///
/// Running this on its own output returns the input unchanged. Values are
/// never touched: only whole comment lines and blank lines are added.
#[must_use]
pub fn annotate(text: &str) -> String {
    let mut scanner = Scanner::default();
    let mut out: Vec<String> = Vec::new();

    for line in text.lines() {
        let first_key = scanner.scan_line(line);
        if let Some(banner) = first_key.as_deref().and_then(banner_for) {
            if !already_bannered(&out, banner) {
                if out.last().is_some_and(|prev| {
                    let prev = prev.trim();
                    !prev.is_empty() && prev != "{"
                }) {
                    out.push(String::new());
                }
                let indent_len = line.len().saturating_sub(line.trim_start().len());
                let indent = line.get(..indent_len).unwrap_or_default();
                out.push(format!("{indent}{banner}"));
            }
        }
        out.push(line.to_owned());
    }

    let joined = out.join("\n");
    let collapsed = BLANK_RUNS.replace_all(&joined, "\n\n");
    format!("{}\n", collapsed.trim_end())
}

fn banner_for(key: &str) -> Option<&'static str> {
    BANNERS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, banner)| *banner)
}

fn already_bannered(out: &[String], banner: &str) -> bool {
    out.iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .is_some_and(|l| l == banner)
}

/// Tracks lexical state across lines.
#[derive(Debug, Default)]
struct Scanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
    in_block_comment: bool,
    expect_key: bool,
    key: Option<String>,
}

impl Scanner {
    /// Advance over one line. Returns the top-level key if the line begins
    /// with one.
    fn scan_line(&mut self, line: &str) -> Option<String> {
        let starts_with_key = !self.in_string
            && !self.in_block_comment
            && self.depth == 1
            && self.expect_key
            && line.trim_start().starts_with('"');
        let mut found = None;

        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if self.in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block_comment = false;
                }
                continue;
            }
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == '"' {
                    self.in_string = false;
                    if let Some(key) = self.key.take() {
                        self.expect_key = false;
                        if found.is_none() {
                            found = Some(key);
                        }
                    }
                } else if let Some(key) = self.key.as_mut() {
                    key.push(c);
                }
                continue;
            }
            match c {
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.in_block_comment = true;
                },
                '"' => {
                    self.in_string = true;
                    if self.depth == 1 && self.expect_key {
                        self.key = Some(String::new());
                    }
                },
                '{' | '[' => {
                    self.depth = self.depth.saturating_add(1);
                    self.expect_key = c == '{' && self.depth == 1;
                },
                '}' | ']' => self.depth = self.depth.saturating_sub(1),
                ',' if self.depth == 1 => self.expect_key = true,
                _ => {},
            }
        }

        if starts_with_key { found } else { None }
    }
}
