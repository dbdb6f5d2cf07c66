use serde_json::{Map, Value};

/// Navigate into a nested value by dotted path (`codeStyle.modernize`).
///
/// An empty path returns `value` itself.
#[must_use]
pub fn get_nested<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// Build a partial document that sets `path` to `leaf` when deep-merged.
///
/// `nested_overlay("codeStyle.lineWidth", 100.into())` yields
/// `{"codeStyle": {"lineWidth": 100}}`.
#[must_use]
pub fn nested_overlay(path: &str, leaf: Value) -> Value {
    let parts: Vec<&str> = segments(path).collect();
    parts.iter().rev().fold(leaf, |inner, segment| {
        let mut map = Map::new();
        map.insert((*segment).to_owned(), inner);
        Value::Object(map)
    })
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}
