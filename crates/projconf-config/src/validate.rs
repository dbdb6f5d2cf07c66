//! Structural validation of untyped config documents.
//!
//! Validation is total: every field in [`crate::schema::RECORD_FIELDS`] is
//! checked and every problem is reported, so callers can tell "missing field"
//! failures (older schema, fill from defaults) apart from wrong-typed or
//! out-of-set values.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::schema::{FieldKind, FieldSpec, RECORD_FIELDS};
use crate::types::ConfigRecord;

static VERSION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").expect("invalid regex"));

/// Path used for problems with the document root itself.
pub const ROOT_PATH: &str = "(root)";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the field, e.g. `features.themeMode`.
    pub path: String,
    /// What went wrong.
    pub kind: IssueKind,
}

/// Classification of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Required key is absent.
    Missing {
        /// Description of the expected value.
        expected: String,
    },
    /// Key is present with a wrong type or an out-of-set value.
    Invalid {
        /// Description of the expected value.
        expected: String,
        /// Short rendering of the value found.
        found: String,
    },
}

impl ValidationIssue {
    fn missing(path: String, kind: FieldKind) -> Self {
        Self {
            path,
            kind: IssueKind::Missing {
                expected: kind.describe(),
            },
        }
    }

    fn invalid(path: String, expected: String, value: &Value) -> Self {
        Self {
            path,
            kind: IssueKind::Invalid {
                expected,
                found: describe_value(value),
            },
        }
    }

    /// Whether this issue is an absent required key.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, IssueKind::Missing { .. })
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Missing { expected } => {
                write!(f, "{}: missing, expected {expected}", self.path)
            },
            IssueKind::Invalid { expected, found } => {
                write!(f, "{}: expected {expected}, found {found}", self.path)
            },
        }
    }
}

/// Whether every issue is a missing key (the auto-fixable case).
#[must_use]
pub fn only_missing_fields(issues: &[ValidationIssue]) -> bool {
    !issues.is_empty() && issues.iter().all(ValidationIssue::is_missing)
}

/// Validate an untyped document and convert it to a [`ConfigRecord`].
///
/// # Errors
///
/// Returns every validation issue found, in schema order.
pub fn validate(raw: &Value) -> Result<ConfigRecord, Vec<ValidationIssue>> {
    let Some(object) = raw.as_object() else {
        return Err(vec![ValidationIssue::invalid(
            ROOT_PATH.to_owned(),
            "an object".to_owned(),
            raw,
        )]);
    };

    let mut issues = Vec::new();
    check_fields(RECORD_FIELDS, object, "", &mut issues);
    if !issues.is_empty() {
        return Err(issues);
    }

    let mut normalized = object.clone();
    normalize_integers(RECORD_FIELDS, &mut normalized);
    serde_json::from_value(Value::Object(normalized)).map_err(|e| {
        vec![ValidationIssue {
            path: ROOT_PATH.to_owned(),
            kind: IssueKind::Invalid {
                expected: "a config record".to_owned(),
                found: e.to_string(),
            },
        }]
    })
}

/// Re-check a typed record.
///
/// The type system already enforces enum membership; this catches the rules
/// it cannot express (non-empty names, the version pattern, integer ranges).
///
/// # Errors
///
/// Returns every validation issue found.
pub fn validate_record(record: &ConfigRecord) -> Result<(), Vec<ValidationIssue>> {
    let value = serde_json::to_value(record).map_err(|e| {
        vec![ValidationIssue {
            path: ROOT_PATH.to_owned(),
            kind: IssueKind::Invalid {
                expected: "a serializable record".to_owned(),
                found: e.to_string(),
            },
        }]
    })?;
    validate(&value).map(|_| ())
}

/// Check `fields` against `object`, appending issues under `prefix`.
pub(crate) fn check_fields(
    fields: &[FieldSpec],
    object: &Map<String, Value>,
    prefix: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for spec in fields {
        let path = join_path(prefix, spec.key);
        match object.get(spec.key) {
            None => {
                if !spec.optional {
                    issues.push(ValidationIssue::missing(path, spec.kind));
                }
            },
            Some(Value::Null) if spec.optional => {},
            Some(value) => check_value(spec.kind, value, &path, issues),
        }
    }
}

/// Check a present value against `kind`, appending issues at `path`.
pub(crate) fn check_value(
    kind: FieldKind,
    value: &Value,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    match kind {
        FieldKind::Group(fields) => match value.as_object() {
            Some(object) => check_fields(fields, object, path, issues),
            None => issues.push(ValidationIssue::invalid(
                path.to_owned(),
                kind.describe(),
                value,
            )),
        },
        FieldKind::StringMap => match value.as_object() {
            Some(object) => {
                for (key, entry) in object {
                    if !entry.is_string() {
                        issues.push(ValidationIssue::invalid(
                            join_path(path, key),
                            "a string".to_owned(),
                            entry,
                        ));
                    }
                }
            },
            None => issues.push(ValidationIssue::invalid(
                path.to_owned(),
                kind.describe(),
                value,
            )),
        },
        _ => {
            if !scalar_is_valid(kind, value) {
                issues.push(ValidationIssue::invalid(
                    path.to_owned(),
                    kind.describe(),
                    value,
                ));
            }
        },
    }
}

/// Whether `value` is independently valid for `kind`.
#[must_use]
pub fn value_is_valid(kind: FieldKind, value: &Value) -> bool {
    let mut issues = Vec::new();
    check_value(kind, value, "", &mut issues);
    issues.is_empty()
}

fn scalar_is_valid(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::Text { non_empty } => value
            .as_str()
            .is_some_and(|s| !non_empty || !s.trim().is_empty()),
        FieldKind::Version => value.as_str().is_some_and(|s| VERSION_PREFIX.is_match(s)),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Integer { min, max } => {
            integer_value(value).is_some_and(|n| (min..=max).contains(&n))
        },
        FieldKind::OneOf(values) => value.as_str().is_some_and(|s| values.contains(&s)),
        FieldKind::TextList => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldKind::Timestamp => value
            .as_str()
            .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
        FieldKind::OpaqueMap => value.is_object(),
        FieldKind::StringMap | FieldKind::Group(_) => value_is_valid(kind, value),
    }
}

/// Read an unsigned integer, accepting integral floats such as `80.0`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn integer_value(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Rewrite integral floats in integer fields as integers so typed
/// deserialization accepts them.
pub(crate) fn normalize_integers(fields: &[FieldSpec], object: &mut Map<String, Value>) {
    for spec in fields {
        let Some(value) = object.get_mut(spec.key) else {
            continue;
        };
        match spec.kind {
            FieldKind::Integer { .. } => {
                if let Some(n) = integer_value(value) {
                    *value = Value::from(n);
                }
            },
            FieldKind::Group(sub) => {
                if let Some(nested) = value.as_object_mut() {
                    normalize_integers(sub, nested);
                }
            },
            _ => {},
        }
    }
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

fn describe_value(value: &Value) -> String {
    const MAX_SHOWN: usize = 40;
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > MAX_SHOWN => {
            let shown: String = s.chars().take(MAX_SHOWN).collect();
            format!("\"{shown}...\"")
        },
        Value::String(s) => format!("\"{s}\""),
        Value::Array(_) => "an array".to_owned(),
        Value::Object(_) => "an object".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::ProjectContext;
    use crate::defaults::build_defaults;

    fn valid_value() -> Value {
        serde_json::to_value(build_defaults(&ProjectContext::default())).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let record = validate(&valid_value()).unwrap();
        assert_eq!(record, build_defaults(&ProjectContext::default()));
    }

    #[test]
    fn test_non_object_root() {
        let issues = validate(&json!([1, 2])).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, ROOT_PATH);
    }

    #[test]
    fn test_reports_every_issue() {
        let mut value = valid_value();
        let obj = value.as_object_mut().unwrap();
        obj.remove("monorepo");
        obj["projectName"] = json!("");
        obj["features"]["themeMode"] = json!("blue");
        obj["codeStyle"]["lineWidth"] = json!(0);

        let issues = validate(&value).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "projectName",
                "monorepo",
                "features.themeMode",
                "codeStyle.lineWidth"
            ]
        );
        assert!(!only_missing_fields(&issues));
    }

    #[test]
    fn test_enum_message_names_the_set() {
        let mut value = valid_value();
        value["features"]["themeMode"] = json!("blue");
        let issues = validate(&value).unwrap_err();
        assert_eq!(
            issues[0].to_string(),
            "features.themeMode: expected one of {light, dark, dark-light}, found \"blue\""
        );
    }

    #[test]
    fn test_missing_only() {
        let mut value = valid_value();
        let obj = value.as_object_mut().unwrap();
        obj.remove("customRules");
        obj["codeStyle"].as_object_mut().unwrap().remove("modernize");

        let issues = validate(&value).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(only_missing_fields(&issues));
        assert_eq!(issues[0].path, "codeStyle.modernize");
        assert_eq!(issues[1].path, "customRules");
    }

    #[test]
    fn test_enum_is_never_coerced() {
        let mut value = valid_value();
        value["gitBehavior"] = json!("AutoYes");
        assert!(validate(&value).is_err());
    }

    #[test]
    fn test_version_prefix() {
        let mut value = valid_value();
        value["projectVersion"] = json!("1.2.3-beta.1");
        assert!(validate(&value).is_ok());
        value["projectVersion"] = json!("1.2");
        let issues = validate(&value).unwrap_err();
        assert_eq!(issues[0].path, "projectVersion");
    }

    #[test]
    fn test_optional_fields_accept_null() {
        let mut value = valid_value();
        value["projectRepository"] = Value::Null;
        value["projectRuntime"] = Value::Null;
        let record = validate(&value).unwrap();
        assert!(record.project_repository.is_none());
    }

    #[test]
    fn test_string_map_entries_checked() {
        let mut value = valid_value();
        value["preferredLibraries"] = json!({ "database": "drizzle", "auth": 3 });
        let issues = validate(&value).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "preferredLibraries.auth");
    }

    #[test]
    fn test_custom_rules_are_opaque() {
        let mut value = valid_value();
        value["customRules"] = json!({ "anything": [1, { "nested": true }] });
        let record = validate(&value).unwrap();
        assert_eq!(record.custom_rules["anything"][1]["nested"], json!(true));
    }

    #[test]
    fn test_integral_float_accepted() {
        let mut value = valid_value();
        value["codeStyle"]["lineWidth"] = json!(100.0);
        let record = validate(&value).unwrap();
        assert_eq!(record.code_style.line_width, 100);

        value["codeStyle"]["lineWidth"] = json!(100.5);
        assert!(validate(&value).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut value = valid_value();
        value["legacyField"] = json!(true);
        assert!(validate(&value).is_ok());
    }

    #[test]
    fn test_validate_record_catches_blank_author() {
        let mut record = build_defaults(&ProjectContext::default());
        record.project_author = "   ".to_owned();
        let issues = validate_record(&record).unwrap_err();
        assert_eq!(issues[0].path, "projectAuthor");
    }

    #[test]
    fn test_long_values_truncated_in_messages() {
        let mut value = valid_value();
        value["gitBehavior"] = json!("x".repeat(100));
        let issues = validate(&value).unwrap_err();
        assert!(issues[0].to_string().ends_with("...\""));
    }
}
