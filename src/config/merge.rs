//! Merging settings layers.
//!
//! - Tables merge key by key, recursively.
//! - Arrays are replaced wholesale: a higher layer's `layers = [...]` is the
//!   complete list, not an addition.
//! - Scalars and `null` override.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base.as_object_mut(), overlay) {
        (Some(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, overlay) => *base = overlay,
    }
}

/// Merge layers lowest precedence first.
pub fn merge_all<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut merged = Value::Object(Default::default());
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}
