//! Path generalization and query-parameter classification.
//!
//! Concrete request paths become templates: the first segment is kept (it
//! names the resource family), any segment that literally appears as a key
//! in the response payload is kept (it is vocabulary, not data), and every
//! other segment becomes a positional placeholder like `:param1`.

use std::collections::HashSet;

use serde_json::Value;

use crate::utils::constants::ENUM_VALUE_MAX_LEN;

/// Classification of an observed query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ParamClass {
    /// Short value drawn from a small vocabulary (currencies, flags, ...).
    Enum,
    /// Longer value implying an identifier or free text.
    Dynamic,
}

/// Classify one observed query-parameter value by length.
#[must_use]
pub fn classify_param(value: &str) -> ParamClass {
    if value.len() <= ENUM_VALUE_MAX_LEN {
        ParamClass::Enum
    } else {
        ParamClass::Dynamic
    }
}

/// Collect every object key appearing anywhere in the payload.
#[must_use]
pub fn collect_keys(value: &Value) -> HashSet<String> {
    let mut keys = HashSet::new();
    collect_keys_into(value, &mut keys);
    keys
}

fn collect_keys_into(value: &Value, keys: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                keys.insert(key.clone());
                collect_keys_into(child, keys);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_keys_into(item, keys);
            }
        }
        _ => {}
    }
}

/// Generalize a concrete path against the response payload's key set.
///
/// Returns the template and the concrete segments (the latter supply
/// placeholder example values for generated tool definitions).
#[must_use]
pub fn generalize_path(path: &str, response_keys: &HashSet<String>) -> (String, Vec<String>) {
    let segments: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::decode(s).map_or_else(|_| s.to_string(), |d| d.into_owned()))
        .collect();

    let template_segments: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i == 0 || response_keys.contains(segment) {
                segment.clone()
            } else {
                format!(":param{i}")
            }
        })
        .collect();

    (format!("/{}", template_segments.join("/")), segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_first_segment_and_payload_keys() {
        let keys = collect_keys(&json!({"price": 172.5, "currency": "USD"}));
        let (template, segments) = generalize_path("/stocks/IBM/price", &keys);
        assert_eq!(template, "/stocks/:param1/price");
        assert_eq!(segments, vec!["stocks", "IBM", "price"]);
    }

    #[test]
    fn generalizes_everything_unknown() {
        let keys = HashSet::new();
        let (template, _) = generalize_path("/users/42/orders/abc123", &keys);
        assert_eq!(template, "/users/:param1/:param2/:param3");
    }

    #[test]
    fn collects_nested_keys() {
        let keys = collect_keys(&json!({"a": {"b": [{"c": 1}]}}));
        assert!(keys.contains("a") && keys.contains("b") && keys.contains("c"));
    }

    #[test]
    fn classifies_by_value_length() {
        assert_eq!(classify_param("USD"), ParamClass::Enum);
        assert_eq!(classify_param("en-US"), ParamClass::Enum);
        assert_eq!(classify_param("a-long-identifier"), ParamClass::Dynamic);
    }
}
