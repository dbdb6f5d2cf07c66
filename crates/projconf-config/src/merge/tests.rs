use serde_json::{Value, json};

use super::*;
use crate::context::ProjectContext;
use crate::defaults::build_defaults;
use crate::types::{ConfigRecord, MonorepoKind, ThemeMode};
use crate::validate::{validate, validate_record};

fn defaults() -> ConfigRecord {
    build_defaults(&ProjectContext::default())
}

fn stored(record: &ConfigRecord) -> Value {
    serde_json::to_value(record).unwrap()
}

#[test]
fn test_deep_merge_scalars() {
    let mut base = json!({ "codeStyle": { "lineWidth": 80, "quoteMark": "double" } });
    let overlay = json!({ "codeStyle": { "lineWidth": 120 } });

    deep_merge(&mut base, &overlay);

    assert_eq!(base["codeStyle"]["lineWidth"], 120);
    assert_eq!(base["codeStyle"]["quoteMark"], "double");
}

#[test]
fn test_deep_merge_new_keys() {
    let mut base = json!({ "features": { "i18n": false } });
    let overlay = json!({ "features": { "docker": true }, "gitBehavior": "autoYes" });

    deep_merge(&mut base, &overlay);

    assert_eq!(base["features"]["i18n"], false);
    assert_eq!(base["features"]["docker"], true);
    assert_eq!(base["gitBehavior"], "autoYes");
}

#[test]
fn test_deep_merge_arrays_and_null_replace() {
    let mut base = json!({ "ignoreDependencies": ["a", "b"], "projectRepository": "x" });
    let overlay = json!({ "ignoreDependencies": ["c"], "projectRepository": null });

    deep_merge(&mut base, &overlay);

    assert_eq!(base["ignoreDependencies"], json!(["c"]));
    assert!(base["projectRepository"].is_null());
}

#[test]
fn test_valid_record_is_untouched() {
    let mut record = defaults();
    record.project_name = "acme".to_owned();
    record.features.i18n = true;

    let out = reconcile(&stored(&record), &defaults());
    assert_eq!(out.record, record);
    assert!(!out.changed());
}

#[test]
fn test_missing_group_filled_and_user_values_kept() {
    let mut value = stored(&defaults());
    let object = value.as_object_mut().unwrap();
    object.insert("projectName".to_owned(), json!("acme"));
    object.remove("monorepo");

    let out = reconcile(&value, &defaults());
    assert_eq!(out.record.project_name, "acme");
    assert_eq!(out.record.monorepo.kind, MonorepoKind::None);
    assert_eq!(out.filled, vec!["monorepo".to_owned()]);
    assert!(out.replaced.is_empty());
}

#[test]
fn test_invalid_nested_value_replaced_alone() {
    let mut value = stored(&defaults());
    value["features"]["themeMode"] = json!("blue");
    value["features"]["docker"] = json!(true);

    let out = reconcile(&value, &defaults());
    assert_eq!(out.record.features.theme_mode, ThemeMode::DarkLight);
    assert!(out.record.features.docker);
    assert_eq!(out.replaced, vec!["features.themeMode".to_owned()]);
}

#[test]
fn test_deeply_nested_missing_field_filled() {
    let mut value = stored(&defaults());
    value["codeStyle"]["modernize"]
        .as_object_mut()
        .unwrap()
        .remove("replaceFs");
    value["codeStyle"]["modernize"]["replaceHttp"] = json!(true);

    let out = reconcile(&value, &defaults());
    assert!(!out.record.code_style.modernize.replace_fs);
    assert!(out.record.code_style.modernize.replace_http);
    assert_eq!(out.filled, vec!["codeStyle.modernize.replaceFs".to_owned()]);
}

#[test]
fn test_group_of_wrong_type_replaced_wholesale() {
    let mut value = stored(&defaults());
    value["codeStyle"] = json!("compact");

    let out = reconcile(&value, &defaults());
    assert_eq!(out.record.code_style, defaults().code_style);
    assert_eq!(out.replaced, vec!["codeStyle".to_owned()]);
}

#[test]
fn test_preferred_libraries_merge_key_wise() {
    let mut base = defaults();
    base.preferred_libraries
        .insert("database".to_owned(), "drizzle".into());
    base.preferred_libraries
        .insert("auth".to_owned(), "better-auth".into());

    let mut value = stored(&defaults());
    value["preferredLibraries"] = json!({ "database": "prisma", "forms": 5 });

    let out = reconcile(&value, &base);
    let libs = &out.record.preferred_libraries;
    assert_eq!(libs["database"], "prisma");
    assert_eq!(libs["auth"], "better-auth");
    assert!(!libs.contains_key("forms"));
    assert!(out.replaced.is_empty());
    assert_eq!(out.dropped, vec!["preferredLibraries.forms".to_owned()]);
}

#[test]
fn test_preferred_libraries_non_string_falls_back_to_default() {
    let mut base = defaults();
    base.preferred_libraries
        .insert("database".to_owned(), "drizzle".into());

    let mut value = stored(&defaults());
    value["preferredLibraries"] = json!({ "database": false });

    let out = reconcile(&value, &base);
    assert_eq!(out.record.preferred_libraries["database"], "drizzle");
    assert_eq!(out.replaced, vec!["preferredLibraries.database".to_owned()]);
    assert!(out.dropped.is_empty());
}

#[test]
fn test_open_maps_keep_stored_order() {
    let mut base = defaults();
    base.preferred_libraries
        .insert("auth".to_owned(), "better-auth".into());
    base.preferred_libraries
        .insert("database".to_owned(), "drizzle".into());

    let mut value = stored(&defaults());
    value["preferredLibraries"] = json!({ "zod": "zod", "auth": "clerk" });
    value["customRules"] = json!({ "zeta": 1, "alpha": 2 });

    let out = reconcile(&value, &base);
    let libs: Vec<&str> = out
        .record
        .preferred_libraries
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(libs, ["zod", "auth", "database"]);
    assert_eq!(out.record.preferred_libraries["auth"], "clerk");
    let rules: Vec<&str> = out.record.custom_rules.keys().map(String::as_str).collect();
    assert_eq!(rules, ["zeta", "alpha"]);
}

#[test]
fn test_custom_rules_kept_opaque() {
    let mut value = stored(&defaults());
    value["customRules"] = json!({ "maxDepth": [1, { "x": null }] });

    let out = reconcile(&value, &defaults());
    assert_eq!(
        out.record.custom_rules["maxDepth"],
        json!([1, { "x": null }])
    );
    assert!(!out.changed());
}

#[test]
fn test_unknown_keys_dropped_and_reported() {
    let mut value = stored(&defaults());
    value["legacyFlag"] = json!(true);
    value["features"]["oldFeature"] = json!(1);

    let out = reconcile(&value, &defaults());
    assert_eq!(
        out.dropped,
        vec!["features.oldFeature".to_owned(), "legacyFlag".to_owned()]
    );
    let round = stored(&out.record);
    assert!(round.get("legacyFlag").is_none());
}

#[test]
fn test_optional_null_means_absent() {
    let mut value = stored(&defaults());
    value["projectRepository"] = Value::Null;

    let out = reconcile(&value, &defaults());
    assert!(out.record.project_repository.is_none());
    assert!(!out.changed());
}

#[test]
fn test_integral_float_kept() {
    let mut value = stored(&defaults());
    value["codeStyle"]["lineWidth"] = json!(100.0);

    let out = reconcile(&value, &defaults());
    assert_eq!(out.record.code_style.line_width, 100);
    assert!(out.replaced.is_empty());
}

#[test]
fn test_pathological_input_still_validates() {
    let value = json!({
        "projectName": "",
        "projectAuthor": 42,
        "projectVersion": "latest",
        "monorepo": [],
        "features": { "i18n": "yes", "language": [1, 2] },
        "preferredLibraries": "none",
        "codeStyle": { "lineWidth": 0, "indentSize": 99, "modernize": null },
        "gitBehavior": "sometimes",
        "customRules": [],
        "configRevalidateFrequency": "5m",
        "configLastRevalidate": "yesterday"
    });

    let out = reconcile(&value, &defaults());
    validate_record(&out.record).unwrap();
    assert!(out.replaced.contains(&"projectName".to_owned()));
    assert!(out.replaced.contains(&"codeStyle.lineWidth".to_owned()));
    assert!(out.replaced.contains(&"configLastRevalidate".to_owned()));
    assert!(out.filled.contains(&"projectLicense".to_owned()));
}

#[test]
fn test_non_object_falls_back_to_defaults() {
    let out = reconcile(&json!([1, 2]), &defaults());
    assert_eq!(out.record, defaults());
    assert_eq!(out.replaced, vec!["(root)".to_owned()]);
}

#[test]
fn test_merge_idempotent() {
    let value = json!({
        "projectName": "acme",
        "features": { "themeMode": "blue", "docker": true },
        "codeStyle": { "lineWidth": 120 },
        "unknown": 1
    });

    let once = merge(&value, &defaults());
    let twice = merge(&stored(&once), &defaults());
    assert_eq!(once, twice);
    assert_eq!(validate(&stored(&once)).unwrap(), once);
}

#[test]
fn test_salvageable() {
    let junk = json!({ "projectName": "", "features": 3, "$schema": "x" });
    assert!(!salvageable(junk.as_object().unwrap()));

    let partial = json!({ "projectName": "acme", "features": 3 });
    assert!(salvageable(partial.as_object().unwrap()));
}

#[test]
fn test_get_nested() {
    let value = json!({ "codeStyle": { "modernize": { "replaceFs": true } } });
    assert_eq!(
        get_nested(&value, "codeStyle.modernize.replaceFs"),
        Some(&json!(true))
    );
    assert!(get_nested(&value, "codeStyle.missing").is_none());
    assert_eq!(get_nested(&value, ""), Some(&value));
}

#[test]
fn test_nested_overlay() {
    assert_eq!(
        nested_overlay("codeStyle.lineWidth", json!(100)),
        json!({ "codeStyle": { "lineWidth": 100 } })
    );
    assert_eq!(nested_overlay("gitBehavior", json!("autoNo")), json!({ "gitBehavior": "autoNo" }));
}
