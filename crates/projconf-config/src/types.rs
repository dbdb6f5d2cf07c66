//! Configuration record types.
//!
//! [`ConfigRecord`] is the fully validated, typed form of the on-disk
//! document. Values only reach this type through [`crate::validate`], which
//! checks the untyped object graph against [`crate::schema`] first, so the
//! serde attributes here never have to be lenient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declares a closed string enum whose on-disk spellings are also exposed as
/// `VALUES` for the schema table.
macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
        default $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant, )+
        }

        impl $name {
            /// Every accepted on-disk spelling, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            /// On-disk spelling of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $value, )+
                }
            }

            /// Parse an on-disk spelling. Exact match only.
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

config_enum! {
    /// Web or extension framework the project is built on.
    Framework {
        /// Next.js
        Nextjs => "nextjs",
        /// Plain Vite application.
        Vite => "vite",
        /// SvelteKit
        Svelte => "svelte",
        /// Remix
        Remix => "remix",
        /// Astro
        Astro => "astro",
        /// Nuxt
        Nuxt => "nuxt",
        /// `SolidStart` / Solid
        Solid => "solid",
        /// Qwik
        Qwik => "qwik",
        /// Vue
        Vue => "vue",
        /// WXT browser extension.
        Wxt => "wxt",
        /// VS Code extension.
        Vscode => "vscode",
    }
    default Nextjs
}

config_enum! {
    /// Package manager used to install dependencies.
    PackageManager {
        /// npm
        Npm => "npm",
        /// pnpm
        Pnpm => "pnpm",
        /// Yarn
        Yarn => "yarn",
        /// Bun
        Bun => "bun",
    }
    default Npm
}

config_enum! {
    /// JavaScript runtime.
    Runtime {
        /// Node.js
        Node => "node",
        /// Bun
        Bun => "bun",
        /// Deno
        Deno => "deno",
    }
    default Node
}

config_enum! {
    /// Monorepo tooling, if any.
    MonorepoKind {
        /// Single-package repository.
        None => "none",
        /// Turborepo
        Turborepo => "turborepo",
        /// Nx
        Nx => "nx",
        /// pnpm workspaces
        Pnpm => "pnpm",
    }
    default None
}

config_enum! {
    /// Theme modes the project ships.
    ThemeMode {
        /// Light only.
        Light => "light",
        /// Dark only.
        Dark => "dark",
        /// Both, user-selectable.
        DarkLight => "dark-light",
    }
    default DarkLight
}

config_enum! {
    /// Indentation character.
    IndentStyle {
        /// Spaces.
        Space => "space",
        /// Tabs.
        Tab => "tab",
    }
    default Space
}

config_enum! {
    /// Preferred string quote mark.
    QuoteMark {
        /// `'single'`
        Single => "single",
        /// `"double"`
        Double => "double",
    }
    default Double
}

config_enum! {
    /// Trailing comma policy.
    TrailingComma {
        /// Never.
        None => "none",
        /// Where valid in ES5.
        Es5 => "es5",
        /// Everywhere possible.
        All => "all",
    }
    default All
}

config_enum! {
    /// Parentheses around a sole arrow-function parameter.
    ArrowParens {
        /// `(x) => x`
        Always => "always",
        /// `x => x`
        Avoid => "avoid",
    }
    default Always
}

config_enum! {
    /// Preferred declaration form for object types.
    TypeOrInterface {
        /// `type`
        Type => "type",
        /// `interface`
        Interface => "interface",
        /// No preference.
        Mixed => "mixed",
    }
    default Type
}

config_enum! {
    /// Preferred module import form.
    ImportOrRequire {
        /// ES `import`.
        Import => "import",
        /// `CommonJS` `require`.
        Require => "require",
        /// No preference.
        Mixed => "mixed",
    }
    default Import
}

config_enum! {
    /// Whether a class of decision needs interactive confirmation.
    Behavior {
        /// Ask every time.
        Prompt => "prompt",
        /// Proceed without asking.
        AutoYes => "autoYes",
        /// Skip without asking.
        AutoNo => "autoNo",
    }
    default Prompt
}

config_enum! {
    /// How often a reconciliation pass against fresh defaults should run.
    RevalidateFrequency {
        /// Every hour.
        OneHour => "1h",
        /// Every day.
        OneDay => "1d",
        /// Every two days.
        TwoDays => "2d",
        /// Every week.
        SevenDays => "7d",
    }
    default TwoDays
}

// ---------------------------------------------------------------------------
// ConfigRecord
// ---------------------------------------------------------------------------

/// The full project configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    /// Optional JSON schema URL for editor tooling.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Project name. Never empty.
    pub project_name: String,
    /// Project author. Never empty.
    pub project_author: String,
    /// Free-form description.
    pub project_description: String,
    /// Semantic version, `MAJOR.MINOR.PATCH` followed by anything.
    pub project_version: String,
    /// License identifier.
    pub project_license: String,
    /// Repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_repository: Option<String>,

    /// Framework identifier.
    pub project_framework: Framework,
    /// Package manager identifier.
    pub project_package_manager: PackageManager,
    /// Framework version as declared in the package manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_framework_version: Option<String>,
    /// Runtime identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_runtime: Option<Runtime>,
    /// Monorepo descriptor.
    pub monorepo: Monorepo,

    /// Feature flags.
    pub features: Features,
    /// Capability name to chosen library, in the order the user wrote them.
    ///
    /// Values are strings; the validator enforces that before any read
    /// returns or any write lands.
    pub preferred_libraries: serde_json::Map<String, Value>,
    /// Formatting and code style preferences.
    pub code_style: CodeStyle,

    /// Confirmation policy for git operations.
    pub git_behavior: Behavior,
    /// Confirmation policy for deployments.
    pub deploy_behavior: Behavior,
    /// Confirmation policy for dependency installs.
    pub deps_behavior: Behavior,
    /// Confirmation policy for internationalization steps.
    pub i18n_behavior: Behavior,
    /// Confirmation policy for running scripts.
    pub scripts_behavior: Behavior,

    /// Dependency names skipped during checks.
    pub ignore_dependencies: Vec<String>,
    /// Opaque rules consumed by collaborators.
    pub custom_rules: serde_json::Map<String, Value>,

    /// How often [`crate::store::revalidate_config`] reconciles the record.
    pub config_revalidate_frequency: RevalidateFrequency,
    /// When the last reconciliation pass ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_last_revalidate: Option<DateTime<Utc>>,
}

/// Monorepo descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monorepo {
    /// Tooling kind.
    #[serde(rename = "type")]
    pub kind: MonorepoKind,
    /// Workspace package globs or paths.
    pub packages: Vec<String>,
    /// Packages shared between workspace members.
    pub shared_packages: Vec<String>,
}

/// Feature flags and ordered feature lists.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    /// Internationalization.
    pub i18n: bool,
    /// Analytics.
    pub analytics: bool,
    /// Theme mode.
    pub theme_mode: ThemeMode,
    /// Authentication.
    pub authentication: bool,
    /// API layer.
    pub api: bool,
    /// Database.
    pub database: bool,
    /// Test suite.
    pub testing: bool,
    /// Docker packaging.
    pub docker: bool,
    /// Continuous integration.
    pub ci: bool,
    /// Project commands.
    pub commands: Vec<String>,
    /// Webview targets.
    pub webview: Vec<String>,
    /// Source languages.
    pub language: Vec<String>,
    /// Theme names.
    pub themes: Vec<String>,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            i18n: false,
            analytics: false,
            theme_mode: ThemeMode::default(),
            authentication: false,
            api: false,
            database: false,
            testing: false,
            docker: false,
            ci: false,
            commands: Vec::new(),
            webview: Vec::new(),
            language: vec!["typescript".to_owned()],
            themes: vec!["default".to_owned()],
        }
    }
}

/// Formatting and code style preferences.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeStyle {
    /// Maximum line width.
    pub line_width: u16,
    /// Indent width in columns.
    pub indent_size: u8,
    /// Indent character.
    pub indent_style: IndentStyle,
    /// Quote mark.
    pub quote_mark: QuoteMark,
    /// Whether statements end with semicolons.
    pub semicolons: bool,
    /// Trailing comma policy.
    pub trailing_comma: TrailingComma,
    /// Spaces inside object braces.
    pub bracket_spacing: bool,
    /// Arrow-function parameter parentheses.
    pub arrow_parens: ArrowParens,
    /// Keep comments when transforming sources.
    pub dont_remove_comments: bool,
    /// Object type declaration style.
    pub type_or_interface: TypeOrInterface,
    /// Module import style.
    pub import_or_require: ImportOrRequire,
    /// Legacy API modernization toggles.
    pub modernize: Modernize,
    /// Import alias prefix, e.g. `~` in `~/lib/utils`.
    pub import_symbol: String,
}

impl Default for CodeStyle {
    fn default() -> Self {
        Self {
            line_width: 80,
            indent_size: 2,
            indent_style: IndentStyle::default(),
            quote_mark: QuoteMark::default(),
            semicolons: true,
            trailing_comma: TrailingComma::default(),
            bracket_spacing: true,
            arrow_parens: ArrowParens::default(),
            dont_remove_comments: true,
            type_or_interface: TypeOrInterface::default(),
            import_or_require: ImportOrRequire::default(),
            modernize: Modernize::default(),
            import_symbol: "~".to_owned(),
        }
    }
}

/// Toggles for replacing legacy Node APIs with modern equivalents.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modernize {
    /// `fs` callbacks.
    pub replace_fs: bool,
    /// `path` helpers.
    pub replace_path: bool,
    /// `http` client.
    pub replace_http: bool,
    /// `process` globals.
    pub replace_process: bool,
    /// `console` logging.
    pub replace_console: bool,
    /// `events` emitters.
    pub replace_events: bool,
}
