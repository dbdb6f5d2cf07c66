//! Project context: the externally detected facts defaults are derived from.
//!
//! [`ProjectContext`] is a plain snapshot value; [`crate::defaults`] is a
//! pure function of it. [`ProjectProbe`] builds one by sniffing a project
//! directory. The probe memoises the formatter-config read in a cell it owns,
//! so each probe instance (and each test) starts from a clean slate.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::types::{
    ArrowParens, Framework, IndentStyle, MonorepoKind, PackageManager, QuoteMark, Runtime,
    TrailingComma,
};

/// Framework identifier paired with the npm package that implies it.
///
/// Order matters: meta-frameworks come before the libraries they build on.
pub const FRAMEWORK_PACKAGES: &[(Framework, &str)] = &[
    (Framework::Nextjs, "next"),
    (Framework::Astro, "astro"),
    (Framework::Svelte, "@sveltejs/kit"),
    (Framework::Nuxt, "nuxt"),
    (Framework::Remix, "@remix-run/react"),
    (Framework::Qwik, "@builder.io/qwik"),
    (Framework::Solid, "solid-js"),
    (Framework::Wxt, "wxt"),
    (Framework::Vscode, "@types/vscode"),
    (Framework::Vue, "vue"),
    (Framework::Vite, "vite"),
];

const FRAMEWORK_MARKERS: &[(&str, Framework)] = &[
    ("next.config.js", Framework::Nextjs),
    ("next.config.mjs", Framework::Nextjs),
    ("next.config.ts", Framework::Nextjs),
    ("astro.config.mjs", Framework::Astro),
    ("astro.config.ts", Framework::Astro),
    ("svelte.config.js", Framework::Svelte),
    ("nuxt.config.ts", Framework::Nuxt),
    ("remix.config.js", Framework::Remix),
    ("wxt.config.ts", Framework::Wxt),
    ("vite.config.ts", Framework::Vite),
    ("vite.config.js", Framework::Vite),
];

const LOCKFILES: &[(&str, PackageManager)] = &[
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
];

const MONOREPO_MARKERS: &[(&str, MonorepoKind)] = &[
    ("turbo.json", MonorepoKind::Turborepo),
    ("nx.json", MonorepoKind::Nx),
    ("pnpm-workspace.yaml", MonorepoKind::Pnpm),
];

/// Every project-relative path the probe checks for existence.
pub const KNOWN_MARKERS: &[&str] = &[
    // Frameworks
    "next.config.js",
    "next.config.mjs",
    "next.config.ts",
    "astro.config.mjs",
    "astro.config.ts",
    "svelte.config.js",
    "nuxt.config.ts",
    "remix.config.js",
    "wxt.config.ts",
    "vite.config.ts",
    "vite.config.js",
    // Lockfiles
    "bun.lockb",
    "bun.lock",
    "pnpm-lock.yaml",
    "yarn.lock",
    "package-lock.json",
    // Runtimes
    "deno.json",
    "deno.jsonc",
    // Monorepo tooling
    "turbo.json",
    "nx.json",
    "pnpm-workspace.yaml",
    // Feature markers
    "drizzle.config.ts",
    "prisma/schema.prisma",
    "src/app/api/auth/[...all]/route.ts",
    "src/app/api/auth/[...nextauth]/route.ts",
    "src/app/[locale]",
    "messages",
    "src/app/api",
    "src/server/api",
    "vitest.config.ts",
    "jest.config.js",
    "playwright.config.ts",
    "Dockerfile",
    "docker-compose.yml",
    "compose.yaml",
    ".github/workflows",
    "tsconfig.json",
];

/// Formatter config files, in lookup order.
const FORMATTER_FILES: &[&str] = &["biome.json", "biome.jsonc", ".prettierrc", ".prettierrc.json"];

/// Facts read from `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// `name`
    pub name: Option<String>,
    /// `author`, reduced to the display name.
    pub author: Option<String>,
    /// `version`
    pub version: Option<String>,
    /// `license`
    pub license: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `repository`, reduced to its URL.
    pub repository: Option<String>,
    /// `dependencies` and `devDependencies`, name to version range.
    pub dependencies: BTreeMap<String, String>,
    /// `packageManager`, e.g. `pnpm@9.1.0`.
    pub package_manager: Option<String>,
    /// `workspaces` globs.
    pub workspaces: Vec<String>,
}

/// Formatter hints detected from biome or prettier config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatterSettings {
    /// Maximum line width.
    pub line_width: Option<u16>,
    /// Indent width.
    pub indent_width: Option<u8>,
    /// Indent character.
    pub indent_style: Option<IndentStyle>,
    /// Quote mark.
    pub quote_mark: Option<QuoteMark>,
    /// Semicolon usage.
    pub semicolons: Option<bool>,
    /// Trailing comma policy.
    pub trailing_comma: Option<TrailingComma>,
    /// Spaces inside braces.
    pub bracket_spacing: Option<bool>,
    /// Arrow-function parentheses.
    pub arrow_parens: Option<ArrowParens>,
}

/// Snapshot of everything defaults are computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    /// Name of the project directory, used when the manifest has no name.
    pub directory_name: Option<String>,
    /// Detected framework.
    pub framework: Option<Framework>,
    /// Parsed package manifest.
    pub package: PackageMetadata,
    /// Detected formatter settings.
    pub formatter: Option<FormatterSettings>,
    /// Detected package manager.
    pub package_manager: Option<PackageManager>,
    /// Detected runtime.
    pub runtime: Option<Runtime>,
    /// Detected monorepo tooling.
    pub monorepo: Option<MonorepoKind>,
    /// Known marker paths that exist in the project.
    pub markers: BTreeSet<String>,
}

impl ProjectContext {
    /// Whether `name` is a declared dependency or dev dependency.
    #[must_use]
    pub fn has_dependency(&self, name: &str) -> bool {
        self.package.dependencies.contains_key(name)
    }

    /// Whether the project-relative marker path exists.
    #[must_use]
    pub fn has_marker(&self, path: &str) -> bool {
        self.markers.contains(path)
    }

    /// Add a declared dependency.
    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.package.dependencies.insert(name.into(), version.into());
        self
    }

    /// Add an existing marker path.
    #[must_use]
    pub fn with_marker(mut self, path: impl Into<String>) -> Self {
        self.markers.insert(path.into());
        self
    }
}

/// Sniffs a project directory and produces a [`ProjectContext`].
#[derive(Debug)]
pub struct ProjectProbe {
    root: PathBuf,
    formatter: OnceCell<Option<FormatterSettings>>,
}

impl ProjectProbe {
    /// Create a probe rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            formatter: OnceCell::new(),
        }
    }

    /// Project root this probe inspects.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Formatter settings, read once per probe.
    pub async fn formatter_settings(&self) -> Option<&FormatterSettings> {
        self.formatter
            .get_or_init(|| read_formatter_settings(&self.root))
            .await
            .as_ref()
    }

    /// Build a full context snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if `package.json` exists but cannot be read.
    pub async fn context(&self) -> ConfigResult<ProjectContext> {
        let package = self.read_package().await?;

        let mut markers = BTreeSet::new();
        for marker in KNOWN_MARKERS {
            if tokio::fs::try_exists(self.root.join(marker))
                .await
                .unwrap_or(false)
            {
                markers.insert((*marker).to_owned());
            }
        }

        let framework = detect_framework(&markers, &package.dependencies);
        let package_manager = detect_package_manager(&markers, package.package_manager.as_deref());
        let runtime = detect_runtime(&markers, package_manager, package.name.is_some());
        let monorepo = detect_monorepo(&markers, &package.workspaces, package_manager);

        let context = ProjectContext {
            directory_name: self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            framework,
            package,
            formatter: self.formatter_settings().await.cloned(),
            package_manager,
            runtime,
            monorepo,
            markers,
        };
        debug!(
            root = %self.root.display(),
            framework = ?context.framework,
            package_manager = ?context.package_manager,
            markers = context.markers.len(),
            "probed project context"
        );
        Ok(context)
    }

    async fn read_package(&self) -> ConfigResult<PackageMetadata> {
        let path = self.root.join("package.json");
        let Some(content) = read_optional(&path).await? else {
            debug!(path = %path.display(), "no package manifest");
            return Ok(PackageMetadata::default());
        };
        match json5::from_str::<Value>(&content) {
            Ok(value) => Ok(parse_package(&value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed package manifest");
                Ok(PackageMetadata::default())
            },
        }
    }
}

/// Read a file, mapping "not found" to `None`.
async fn read_optional(path: &Path) -> ConfigResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::io(path, "read", e)),
    }
}

async fn read_formatter_settings(root: &Path) -> Option<FormatterSettings> {
    for file in FORMATTER_FILES {
        let path = root.join(file);
        let Ok(content) = tokio::fs::read_to_string(&path).await else {
            continue;
        };
        let value: Value = match json5::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed formatter config");
                continue;
            },
        };
        debug!(path = %path.display(), "read formatter config");
        return Some(if file.starts_with("biome") {
            parse_biome(&value)
        } else {
            parse_prettier(&value)
        });
    }
    None
}

/// Extract manifest facts from a parsed `package.json`.
#[must_use]
pub fn parse_package(value: &Value) -> PackageMetadata {
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    let author = match value.get("author") {
        Some(Value::String(s)) => author_name(s),
        Some(Value::Object(obj)) => obj.get("name").and_then(Value::as_str).and_then(author_name),
        _ => None,
    };

    let repository = match value.get("repository") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj.get("url").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    };

    let mut dependencies = BTreeMap::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = value.get(section).and_then(Value::as_object) {
            for (name, range) in deps {
                dependencies
                    .entry(name.clone())
                    .or_insert_with(|| range.as_str().unwrap_or_default().to_owned());
            }
        }
    }

    let workspaces = match value.get("workspaces") {
        Some(Value::Array(items)) => string_list(items),
        Some(Value::Object(obj)) => obj
            .get("packages")
            .and_then(Value::as_array)
            .map(|items| string_list(items))
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    PackageMetadata {
        name: text("name"),
        author,
        version: text("version"),
        license: text("license"),
        description: text("description"),
        repository,
        dependencies,
        package_manager: text("packageManager"),
        workspaces,
    }
}

/// `"Jane Doe <jane@example.com> (https://...)"` becomes `"Jane Doe"`.
fn author_name(raw: &str) -> Option<String> {
    let name = raw.split(['<', '(']).next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_owned())
}

fn string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}

/// Formatter hints from a biome config.
#[must_use]
pub fn parse_biome(value: &Value) -> FormatterSettings {
    let formatter = value.get("formatter");
    let js = value.get("javascript").and_then(|v| v.get("formatter"));
    let js_str = |key: &str| js.and_then(|f| f.get(key)).and_then(Value::as_str);

    FormatterSettings {
        line_width: formatter.and_then(|f| small_int(f.get("lineWidth"))),
        indent_width: formatter.and_then(|f| small_int(f.get("indentWidth"))),
        indent_style: formatter
            .and_then(|f| f.get("indentStyle"))
            .and_then(Value::as_str)
            .and_then(IndentStyle::parse),
        quote_mark: js_str("quoteStyle").and_then(QuoteMark::parse),
        semicolons: js_str("semicolons").map(|s| s == "always"),
        trailing_comma: js_str("trailingCommas")
            .or_else(|| js_str("trailingComma"))
            .and_then(TrailingComma::parse),
        bracket_spacing: js.and_then(|f| f.get("bracketSpacing")).and_then(Value::as_bool),
        arrow_parens: js_str("arrowParentheses").map(|s| {
            if s == "asNeeded" {
                ArrowParens::Avoid
            } else {
                ArrowParens::Always
            }
        }),
    }
}

/// Formatter hints from a prettier config.
#[must_use]
pub fn parse_prettier(value: &Value) -> FormatterSettings {
    let flag = |key: &str| value.get(key).and_then(Value::as_bool);
    FormatterSettings {
        line_width: small_int(value.get("printWidth")),
        indent_width: small_int(value.get("tabWidth")),
        indent_style: flag("useTabs").map(|tabs| {
            if tabs {
                IndentStyle::Tab
            } else {
                IndentStyle::Space
            }
        }),
        quote_mark: flag("singleQuote").map(|single| {
            if single {
                QuoteMark::Single
            } else {
                QuoteMark::Double
            }
        }),
        semicolons: flag("semi"),
        trailing_comma: value
            .get("trailingComma")
            .and_then(Value::as_str)
            .and_then(TrailingComma::parse),
        bracket_spacing: flag("bracketSpacing"),
        arrow_parens: value
            .get("arrowParens")
            .and_then(Value::as_str)
            .and_then(ArrowParens::parse),
    }
}

fn small_int<T: TryFrom<u64>>(value: Option<&Value>) -> Option<T> {
    value
        .and_then(Value::as_u64)
        .and_then(|n| T::try_from(n).ok())
}

/// Pick the framework from marker files first, then dependencies.
#[must_use]
pub fn detect_framework(
    markers: &BTreeSet<String>,
    dependencies: &BTreeMap<String, String>,
) -> Option<Framework> {
    FRAMEWORK_MARKERS
        .iter()
        .find(|(marker, _)| markers.contains(*marker))
        .map(|(_, framework)| *framework)
        .or_else(|| {
            FRAMEWORK_PACKAGES
                .iter()
                .find(|(_, package)| dependencies.contains_key(*package))
                .map(|(framework, _)| *framework)
        })
}

/// Prefer the manifest's `packageManager` field, then lockfiles.
#[must_use]
pub fn detect_package_manager(
    markers: &BTreeSet<String>,
    declared: Option<&str>,
) -> Option<PackageManager> {
    declared
        .and_then(|d| d.split('@').next())
        .and_then(PackageManager::parse)
        .or_else(|| {
            LOCKFILES
                .iter()
                .find(|(lockfile, _)| markers.contains(*lockfile))
                .map(|(_, pm)| *pm)
        })
}

fn detect_runtime(
    markers: &BTreeSet<String>,
    package_manager: Option<PackageManager>,
    has_manifest: bool,
) -> Option<Runtime> {
    if markers.contains("deno.json") || markers.contains("deno.jsonc") {
        Some(Runtime::Deno)
    } else if package_manager == Some(PackageManager::Bun) {
        Some(Runtime::Bun)
    } else if has_manifest || package_manager.is_some() {
        Some(Runtime::Node)
    } else {
        None
    }
}

fn detect_monorepo(
    markers: &BTreeSet<String>,
    workspaces: &[String],
    package_manager: Option<PackageManager>,
) -> Option<MonorepoKind> {
    MONOREPO_MARKERS
        .iter()
        .find(|(marker, _)| markers.contains(*marker))
        .map(|(_, kind)| *kind)
        .or_else(|| {
            (!workspaces.is_empty() && package_manager == Some(PackageManager::Pnpm))
                .then_some(MonorepoKind::Pnpm)
        })
}
