//! Structural link extraction from JSON payloads.
//!
//! API responses embed URLs in arbitrary positions (pagination cursors,
//! `href` fields, nested resource lists); a recursive traversal finds them
//! without caring about the surrounding schema.

use serde_json::Value;

fn looks_like_link(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

fn walk(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if looks_like_link(s) && !out.iter().any(|seen| seen == s) {
                out.push(s.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                walk(item, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Collect every URL-shaped string value in the payload, depth-first,
/// deduplicated in encounter order.
#[must_use]
pub fn extract_json_links(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    walk(value, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_nested_links() {
        let payload = json!({
            "items": [
                {"href": "https://api.test/items/1", "name": "one"},
                {"href": "https://api.test/items/2", "count": 3}
            ],
            "next": "https://api.test/items?page=2",
            "flag": true
        });
        let links = extract_json_links(&payload);
        assert_eq!(links.len(), 3);
        assert!(links.contains(&"https://api.test/items?page=2".to_string()));
    }

    #[test]
    fn ignores_non_url_strings_and_dedups() {
        let payload = json!({
            "a": "not a url",
            "b": "https://api.test/x",
            "c": ["https://api.test/x"]
        });
        assert_eq!(extract_json_links(&payload), vec!["https://api.test/x"]);
    }
}
