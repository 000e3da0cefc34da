use serde_json::Value;

use crate::http::error::ExecutorError;

/// Flattens a JSON payload into query pairs using bracket notation.
///
/// Arrays become `key[]=a&key[]=b` in element order and nested objects
/// become `key[sub]=v`. Empty arrays and objects contribute nothing.
pub fn to_query_pairs(payload: &Value) -> Result<Vec<(String, String)>, ExecutorError> {
    match payload {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => {
            let mut pairs = Vec::new();
            for (key, value) in map {
                push_pairs(key.clone(), value, &mut pairs);
            }
            Ok(pairs)
        }
        other => Err(ExecutorError::InvalidRequest(format!(
            "GET payload must be an object or null, got {}",
            kind_name(other)
        ))),
    }
}

fn push_pairs(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => pairs.push((prefix, String::new())),
        Value::Bool(b) => pairs.push((prefix, b.to_string())),
        Value::Number(n) => pairs.push((prefix, n.to_string())),
        Value::String(s) => pairs.push((prefix, s.clone())),
        Value::Array(items) => {
            for item in items {
                push_pairs(format!("{prefix}[]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                push_pairs(format!("{prefix}[{key}]"), item, pairs);
            }
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
