use serde_json::{Map, Value};

/// Merges `other` into `target`, recursing into nested objects.
///
/// Keys of `other` win. Arrays and scalars are replaced, never concatenated.
pub fn deep_merge(target: &mut Map<String, Value>, other: &Map<String, Value>) {
    for (key, incoming) in other {
        match (target.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                deep_merge(existing, nested);
            }
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}
