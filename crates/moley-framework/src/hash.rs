use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hashes the canonical (key-sorted) JSON form of `value`. Two configs
/// that serialize to the same set of fields in different orders produce
/// the same key, so field reordering in a source file never looks like a
/// remove-then-add to the diff.
pub fn canonical_key<T: Serialize>(value: &T) -> String {
    let raw = serde_json::to_value(value).expect("config/state types always serialize");
    let sorted = sort_json_keys(raw);
    let canonical = serde_json::to_vec(&sorted).expect("sorted value always serializes");
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}

fn sort_json_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: std::collections::BTreeMap<String, Value> = std::collections::BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k, sort_json_keys(v));
            }
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_json_keys).collect()),
        other => other,
    }
}
