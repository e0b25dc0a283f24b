//! Grains to Sal facts.
//!
//! Sal stores facts as flat string pairs, so nested grains are flattened
//! into `parent=>child` keys.

use serde_json::{Map, Value};

const KEY_SEPARATOR: &str = "=>";

/// Strip NUL characters from top-level string values. `productname` and
/// `model` sometimes carry them.
pub fn clean(grains: Map<String, Value>) -> Map<String, Value> {
    grains
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, Value::String(s.replace('\u{0000}', ""))),
            other => (k, other),
        })
        .collect()
}

pub fn flatten(grains: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (k, v) in grains {
        flatten_into(v, k, &mut out);
    }
    out
}

fn flatten_into(value: &Value, key: &str, out: &mut Map<String, Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(v, &format!("{key}{KEY_SEPARATOR}{k}"), out);
            }
        }
        Value::Array(items) if items.iter().all(is_scalar) => {
            let joined = items.iter().map(scalar_text).collect::<Vec<_>>().join(", ");
            out.insert(key.to_string(), Value::String(joined));
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, &format!("{key}{KEY_SEPARATOR}{index}"), out);
            }
        }
        Value::Null => {}
        scalar => {
            out.insert(key.to_string(), Value::String(scalar_text(scalar)));
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The minion's process id, as recorded in the `pid` grain.
pub fn pid(facts: &Map<String, Value>) -> Option<String> {
    match facts.get("pid")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
