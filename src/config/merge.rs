//! Deep merge for object-valued fields.
//!
//! Scalar and list fields take the value of the highest-priority source that
//! provides one. Object fields are merged key-by-key across every source that
//! provides an object, so a file can set `{"host": ..}` while a
//! higher-priority source overrides only `{"port": ..}`.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans are replaced entirely
/// - A nested `null` in overlay keeps the base value
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge values given highest priority first.
///
/// Only the leading run of objects takes part: a non-object value shadows
/// everything below it, matching first-wins for scalars.
pub fn merge_by_priority(values: impl IntoIterator<Item = Value>) -> Option<Value> {
    let mut objects = Vec::new();
    for value in values {
        let is_object = value.is_object();
        if !is_object && !objects.is_empty() {
            break;
        }
        objects.push(value);
        if !is_object {
            break;
        }
    }
    objects.into_iter().rev().reduce(deep_merge)
}
