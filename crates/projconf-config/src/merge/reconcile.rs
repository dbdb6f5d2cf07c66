use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::schema::{FieldKind, FieldSpec, RECORD_FIELDS};
use crate::types::ConfigRecord;
use crate::validate::{ROOT_PATH, join_path, normalize_integers, value_is_valid};

/// Result of reconciling a stored document with defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The merged record. Always valid.
    pub record: ConfigRecord,
    /// Paths of required fields that were absent and filled from defaults.
    pub filled: Vec<String>,
    /// Paths of fields whose stored value was invalid and got replaced.
    pub replaced: Vec<String>,
    /// Paths of keys the schema does not know. They are not carried over.
    pub dropped: Vec<String>,
}

impl Reconciled {
    fn new(record: ConfigRecord) -> Self {
        Self {
            record,
            filled: Vec::new(),
            replaced: Vec::new(),
            dropped: Vec::new(),
        }
    }

    /// Whether the merge had to change anything.
    #[must_use]
    pub fn changed(&self) -> bool {
        !(self.filled.is_empty() && self.replaced.is_empty() && self.dropped.is_empty())
    }
}

/// Merge `existing` with `defaults`, keeping every valid stored value.
#[must_use]
pub fn merge(existing: &Value, defaults: &ConfigRecord) -> ConfigRecord {
    reconcile(existing, defaults).record
}

/// Merge `existing` with `defaults` and report what had to change.
///
/// Per schema field: a present, independently valid value is kept; an
/// absent required field is filled; anything else takes the default. Groups
/// recurse. Open maps merge key-wise with stored entries winning. The
/// result always validates.
#[must_use]
pub fn reconcile(existing: &Value, defaults: &ConfigRecord) -> Reconciled {
    let default_map = match serde_json::to_value(defaults) {
        Ok(Value::Object(map)) => map,
        _ => {
            warn!("Default record did not serialize to an object; using defaults as-is");
            return Reconciled::new(defaults.clone());
        },
    };

    let Some(existing_map) = existing.as_object() else {
        let mut out = Reconciled::new(defaults.clone());
        out.replaced.push(ROOT_PATH.to_owned());
        return out;
    };

    let mut filled = Vec::new();
    let mut replaced = Vec::new();
    let mut dropped = Vec::new();
    let mut merged = merge_fields(
        RECORD_FIELDS,
        existing_map,
        &default_map,
        "",
        &mut Changes {
            filled: &mut filled,
            replaced: &mut replaced,
            dropped: &mut dropped,
        },
    );
    normalize_integers(RECORD_FIELDS, &mut merged);

    match serde_json::from_value::<ConfigRecord>(Value::Object(merged)) {
        Ok(record) => {
            debug!(
                filled = filled.len(),
                replaced = replaced.len(),
                dropped = dropped.len(),
                "Reconciled config with defaults"
            );
            Reconciled {
                record,
                filled,
                replaced,
                dropped,
            }
        },
        Err(e) => {
            warn!(error = %e, "Merged config failed typed conversion; using defaults");
            let mut out = Reconciled::new(defaults.clone());
            out.replaced.push(ROOT_PATH.to_owned());
            out
        },
    }
}

/// Whether any required top-level field of `existing` is independently valid.
///
/// A document with nothing salvageable is regenerated rather than repaired.
#[must_use]
pub fn salvageable(existing: &Map<String, Value>) -> bool {
    RECORD_FIELDS
        .iter()
        .filter(|spec| !spec.optional)
        .any(|spec| {
            existing
                .get(spec.key)
                .is_some_and(|value| value_is_valid(spec.kind, value))
        })
}

struct Changes<'a> {
    filled: &'a mut Vec<String>,
    replaced: &'a mut Vec<String>,
    dropped: &'a mut Vec<String>,
}

fn merge_fields(
    fields: &[FieldSpec],
    existing: &Map<String, Value>,
    defaults: &Map<String, Value>,
    prefix: &str,
    changes: &mut Changes<'_>,
) -> Map<String, Value> {
    let mut out = Map::new();

    for spec in fields {
        let path = join_path(prefix, spec.key);
        let default = defaults.get(spec.key);
        let current = existing
            .get(spec.key)
            .filter(|value| !(spec.optional && value.is_null()));

        let Some(current) = current else {
            if !spec.optional {
                if let Some(default) = default {
                    out.insert(spec.key.to_owned(), default.clone());
                }
                changes.filled.push(path);
            }
            continue;
        };

        let merged = match spec.kind {
            FieldKind::Group(sub) => current.as_object().map(|object| {
                let empty = Map::new();
                let sub_defaults = default.and_then(Value::as_object).unwrap_or(&empty);
                Value::Object(merge_fields(sub, object, sub_defaults, &path, changes))
            }),
            FieldKind::StringMap => current
                .as_object()
                .map(|object| merge_string_map(object, default, &path, changes)),
            FieldKind::OpaqueMap => current
                .as_object()
                .map(|object| merge_open_map(object, default)),
            kind => value_is_valid(kind, current).then(|| current.clone()),
        };

        match merged {
            Some(value) => {
                out.insert(spec.key.to_owned(), value);
            },
            None => {
                if let Some(default) = default {
                    out.insert(spec.key.to_owned(), default.clone());
                }
                changes.replaced.push(path);
            },
        }
    }

    for key in existing.keys() {
        if !fields.iter().any(|spec| spec.key == key) {
            changes.dropped.push(join_path(prefix, key));
        }
    }

    out
}

/// Stored entries win and keep their order; default-only entries follow.
/// A non-string stored entry falls back to the default for that key, or is
/// dropped when there is none.
fn merge_string_map(
    existing: &Map<String, Value>,
    default: Option<&Value>,
    path: &str,
    changes: &mut Changes<'_>,
) -> Value {
    let default_map = default.and_then(Value::as_object);
    let mut out = Map::new();

    for (key, value) in existing {
        if value.is_string() {
            out.insert(key.clone(), value.clone());
            continue;
        }
        match default_map.and_then(|map| map.get(key)) {
            Some(fallback) => {
                out.insert(key.clone(), fallback.clone());
                changes.replaced.push(join_path(path, key));
            },
            None => changes.dropped.push(join_path(path, key)),
        }
    }
    append_missing(&mut out, default_map);
    Value::Object(out)
}

fn merge_open_map(existing: &Map<String, Value>, default: Option<&Value>) -> Value {
    let mut out = existing.clone();
    append_missing(&mut out, default.and_then(Value::as_object));
    Value::Object(out)
}

fn append_missing(out: &mut Map<String, Value>, defaults: Option<&Map<String, Value>>) {
    for (key, value) in defaults.into_iter().flatten() {
        if !out.contains_key(key) {
            out.insert(key.clone(), value.clone());
        }
    }
}
