use crate::value::Value;

/// Deep-merge `overlay` on top of `base`.
/// If both sides are mappings, recurse key by key.
/// Otherwise, `overlay`'s value wins (sequences are replaced, not appended).
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => {
                        let base_val = std::mem::take(slot);
                        *slot = deep_merge(base_val, overlay_val);
                    }
                    None => {
                        base_map.insert(key, overlay_val);
                    }
                }
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}
