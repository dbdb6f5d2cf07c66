//! Versioned schema table for the configuration record.
//!
//! Validation, reconciliation, and number normalisation all walk this one
//! table. A field added in a later schema version therefore shows up as
//! `Missing` in older files, which the reader fixes automatically.

use crate::types::{
    ArrowParens, Behavior, Framework, ImportOrRequire, IndentStyle, MonorepoKind, PackageManager,
    QuoteMark, RevalidateFrequency, Runtime, ThemeMode, TrailingComma, TypeOrInterface,
};

/// Current schema version. Bump when fields are added or their rules change.
pub const SCHEMA_VERSION: u32 = 1;

/// Schema URL written into freshly generated records.
pub const SCHEMA_URL: &str = "https://projconf.dev/schema/v1.json";

/// What a single field must look like.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Any string, optionally required to be non-blank.
    Text {
        /// Reject empty or whitespace-only strings.
        non_empty: bool,
    },
    /// A version string starting with `MAJOR.MINOR.PATCH`.
    Version,
    /// `true` / `false`.
    Boolean,
    /// Unsigned integer within an inclusive range.
    Integer {
        /// Smallest accepted value.
        min: u64,
        /// Largest accepted value.
        max: u64,
    },
    /// One of a fixed set of strings.
    OneOf(&'static [&'static str]),
    /// Array of strings.
    TextList,
    /// RFC 3339 timestamp string.
    Timestamp,
    /// Open map whose values must be strings.
    StringMap,
    /// Open map with opaque values.
    OpaqueMap,
    /// Nested object with its own fields.
    Group(&'static [FieldSpec]),
}

impl FieldKind {
    /// Human-readable description used in validation messages.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::Text { non_empty: true } => "a non-empty string".to_owned(),
            Self::Text { non_empty: false } => "a string".to_owned(),
            Self::Version => "a version string like 1.2.3".to_owned(),
            Self::Boolean => "a boolean".to_owned(),
            Self::Integer { min, max } => format!("an integer between {min} and {max}"),
            Self::OneOf(values) => format!("one of {{{}}}", values.join(", ")),
            Self::TextList => "an array of strings".to_owned(),
            Self::Timestamp => "an RFC 3339 timestamp".to_owned(),
            Self::StringMap => "an object of string values".to_owned(),
            Self::OpaqueMap => "an object".to_owned(),
            Self::Group(_) => "an object".to_owned(),
        }
    }
}

/// One field of the record.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// On-disk key.
    pub key: &'static str,
    /// Shape rule.
    pub kind: FieldKind,
    /// Whether the key may be absent or `null`.
    pub optional: bool,
}

impl FieldSpec {
    const fn required(key: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            optional: false,
        }
    }

    const fn optional(key: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            optional: true,
        }
    }
}

const NON_EMPTY: FieldKind = FieldKind::Text { non_empty: true };
const TEXT: FieldKind = FieldKind::Text { non_empty: false };
const BEHAVIOR: FieldKind = FieldKind::OneOf(Behavior::VALUES);

const MONOREPO: &[FieldSpec] = &[
    FieldSpec::required("type", FieldKind::OneOf(MonorepoKind::VALUES)),
    FieldSpec::required("packages", FieldKind::TextList),
    FieldSpec::required("sharedPackages", FieldKind::TextList),
];

const FEATURES: &[FieldSpec] = &[
    FieldSpec::required("i18n", FieldKind::Boolean),
    FieldSpec::required("analytics", FieldKind::Boolean),
    FieldSpec::required("themeMode", FieldKind::OneOf(ThemeMode::VALUES)),
    FieldSpec::required("authentication", FieldKind::Boolean),
    FieldSpec::required("api", FieldKind::Boolean),
    FieldSpec::required("database", FieldKind::Boolean),
    FieldSpec::required("testing", FieldKind::Boolean),
    FieldSpec::required("docker", FieldKind::Boolean),
    FieldSpec::required("ci", FieldKind::Boolean),
    FieldSpec::required("commands", FieldKind::TextList),
    FieldSpec::required("webview", FieldKind::TextList),
    FieldSpec::required("language", FieldKind::TextList),
    FieldSpec::required("themes", FieldKind::TextList),
];

const MODERNIZE: &[FieldSpec] = &[
    FieldSpec::required("replaceFs", FieldKind::Boolean),
    FieldSpec::required("replacePath", FieldKind::Boolean),
    FieldSpec::required("replaceHttp", FieldKind::Boolean),
    FieldSpec::required("replaceProcess", FieldKind::Boolean),
    FieldSpec::required("replaceConsole", FieldKind::Boolean),
    FieldSpec::required("replaceEvents", FieldKind::Boolean),
];

const CODE_STYLE: &[FieldSpec] = &[
    FieldSpec::required("lineWidth", FieldKind::Integer { min: 1, max: 1000 }),
    FieldSpec::required("indentSize", FieldKind::Integer { min: 1, max: 16 }),
    FieldSpec::required("indentStyle", FieldKind::OneOf(IndentStyle::VALUES)),
    FieldSpec::required("quoteMark", FieldKind::OneOf(QuoteMark::VALUES)),
    FieldSpec::required("semicolons", FieldKind::Boolean),
    FieldSpec::required("trailingComma", FieldKind::OneOf(TrailingComma::VALUES)),
    FieldSpec::required("bracketSpacing", FieldKind::Boolean),
    FieldSpec::required("arrowParens", FieldKind::OneOf(ArrowParens::VALUES)),
    FieldSpec::required("dontRemoveComments", FieldKind::Boolean),
    FieldSpec::required("typeOrInterface", FieldKind::OneOf(TypeOrInterface::VALUES)),
    FieldSpec::required("importOrRequire", FieldKind::OneOf(ImportOrRequire::VALUES)),
    FieldSpec::required("modernize", FieldKind::Group(MODERNIZE)),
    FieldSpec::required("importSymbol", TEXT),
];

/// Top-level fields, in on-disk order.
pub const RECORD_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("$schema", TEXT),
    // Identity
    FieldSpec::required("projectName", NON_EMPTY),
    FieldSpec::required("projectAuthor", NON_EMPTY),
    FieldSpec::required("projectDescription", TEXT),
    FieldSpec::required("projectVersion", FieldKind::Version),
    FieldSpec::required("projectLicense", TEXT),
    FieldSpec::optional("projectRepository", TEXT),
    // Technical stack
    FieldSpec::required("projectFramework", FieldKind::OneOf(Framework::VALUES)),
    FieldSpec::required(
        "projectPackageManager",
        FieldKind::OneOf(PackageManager::VALUES),
    ),
    FieldSpec::optional("projectFrameworkVersion", TEXT),
    FieldSpec::optional("projectRuntime", FieldKind::OneOf(Runtime::VALUES)),
    FieldSpec::required("monorepo", FieldKind::Group(MONOREPO)),
    // Features and preferences
    FieldSpec::required("features", FieldKind::Group(FEATURES)),
    FieldSpec::required("preferredLibraries", FieldKind::StringMap),
    FieldSpec::required("codeStyle", FieldKind::Group(CODE_STYLE)),
    // Behavior policy
    FieldSpec::required("gitBehavior", BEHAVIOR),
    FieldSpec::required("deployBehavior", BEHAVIOR),
    FieldSpec::required("depsBehavior", BEHAVIOR),
    FieldSpec::required("i18nBehavior", BEHAVIOR),
    FieldSpec::required("scriptsBehavior", BEHAVIOR),
    // Governance
    FieldSpec::required("ignoreDependencies", FieldKind::TextList),
    FieldSpec::required("customRules", FieldKind::OpaqueMap),
    // Revalidation bookkeeping
    FieldSpec::required(
        "configRevalidateFrequency",
        FieldKind::OneOf(RevalidateFrequency::VALUES),
    ),
    FieldSpec::optional("configLastRevalidate", FieldKind::Timestamp),
];

/// Look up a top-level field by key.
#[must_use]
pub fn field(key: &str) -> Option<&'static FieldSpec> {
    RECORD_FIELDS.iter().find(|spec| spec.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keys_are_unique() {
        let mut keys: Vec<&str> = RECORD_FIELDS.iter().map(|f| f.key).collect();
        let before = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn test_describe_one_of() {
        let kind = FieldKind::OneOf(ThemeMode::VALUES);
        assert_eq!(kind.describe(), "one of {light, dark, dark-light}");
    }

    #[test]
    fn test_field_lookup() {
        assert!(matches!(
            field("monorepo").map(|f| f.kind),
            Some(FieldKind::Group(_))
        ));
        assert!(field("projectRepository").is_some_and(|f| f.optional));
        assert!(field("nonexistent").is_none());
    }
}
