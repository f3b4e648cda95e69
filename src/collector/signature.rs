//! Structural schema signatures.
//!
//! A signature is a fingerprint of a JSON value's *shape*, ignoring the
//! concrete data: primitive type names for scalars, `{items:<shape>}` for
//! arrays with element shapes merged, `{properties:{...}}` for objects.
//! Two endpoints with the same generalized path and the same signature are
//! the same logical API.

use std::collections::BTreeMap;

use serde_json::Value;

/// Recursive type-shape of a JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonShape {
    Null,
    Bool,
    Number,
    String,
    Array(Box<JsonShape>),
    Object(BTreeMap<String, JsonShape>),
}

impl JsonShape {
    /// Derive the shape of a concrete value. Array element shapes are
    /// merged across all elements; an empty array has `Null` items.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(items) => {
                let merged = items
                    .iter()
                    .map(Self::of)
                    .fold(Self::Null, |acc, shape| Self::merge(&acc, &shape));
                Self::Array(Box::new(merged))
            }
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::of(v)))
                    .collect(),
            ),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool => 1,
            Self::Number => 2,
            Self::String => 3,
            Self::Array(_) => 4,
            Self::Object(_) => 5,
        }
    }

    /// Merge two shapes commutatively.
    ///
    /// Same variants merge recursively (objects union their keys); `Null`
    /// yields to anything; mismatched variants collapse to the more
    /// structured one so merge order cannot change the outcome.
    #[must_use]
    pub fn merge(a: &Self, b: &Self) -> Self {
        match (a, b) {
            (Self::Null, other) | (other, Self::Null) => other.clone(),
            (Self::Array(x), Self::Array(y)) => Self::Array(Box::new(Self::merge(x, y))),
            (Self::Object(x), Self::Object(y)) => {
                let mut merged = x.clone();
                for (key, shape) in y {
                    merged
                        .entry(key.clone())
                        .and_modify(|existing| *existing = Self::merge(existing, shape))
                        .or_insert_with(|| shape.clone());
                }
                Self::Object(merged)
            }
            (x, y) if x == y => x.clone(),
            (x, y) => {
                if x.rank() >= y.rank() {
                    x.clone()
                } else {
                    y.clone()
                }
            }
        }
    }

    /// Deterministic textual rendering; `BTreeMap` ordering makes this
    /// independent of key insertion order.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Number => "number".to_string(),
            Self::String => "string".to_string(),
            Self::Array(items) => format!("{{items:{}}}", items.render()),
            Self::Object(map) => {
                let fields: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k}:{}", v.render()))
                    .collect();
                format!("{{properties:{{{}}}}}", fields.join(","))
            }
        }
    }
}

/// Fingerprint of an endpoint's request and response payload shapes.
#[must_use]
pub fn schema_signature(request_body: Option<&Value>, response_body: Option<&Value>) -> String {
    let render = |value: Option<&Value>| match value {
        Some(v) => JsonShape::of(v).render(),
        None => "none".to_string(),
    };
    format!("req={}|res={}", render(request_body), render(response_body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_render_as_type_names() {
        assert_eq!(JsonShape::of(&json!(null)).render(), "null");
        assert_eq!(JsonShape::of(&json!(true)).render(), "bool");
        assert_eq!(JsonShape::of(&json!(3.5)).render(), "number");
        assert_eq!(JsonShape::of(&json!("x")).render(), "string");
    }

    #[test]
    fn structurally_identical_values_share_a_signature() {
        let a = json!({"symbol": "IBM", "price": 172.5});
        let b = json!({"symbol": "AAPL", "price": 189.2});
        assert_eq!(
            schema_signature(None, Some(&a)),
            schema_signature(None, Some(&b))
        );
    }

    #[test]
    fn different_shapes_differ() {
        let a = json!({"price": 172.5});
        let b = json!({"price": "172.5"});
        assert_ne!(
            schema_signature(None, Some(&a)),
            schema_signature(None, Some(&b))
        );
    }

    #[test]
    fn array_elements_merge_across_items() {
        let v = json!([{"a": 1}, {"b": "x"}]);
        let shape = JsonShape::of(&v);
        assert_eq!(
            shape.render(),
            "{items:{properties:{a:number,b:string}}}"
        );
    }

    #[test]
    fn merge_is_commutative() {
        let a = JsonShape::of(&json!({"x": [1, 2], "y": "s"}));
        let b = JsonShape::of(&json!({"x": [], "z": true}));
        assert_eq!(JsonShape::merge(&a, &b), JsonShape::merge(&b, &a));
    }

    #[test]
    fn key_order_does_not_affect_rendering() {
        let a = json!({"b": 1, "a": "x"});
        let b = json!({"a": "y", "b": 2});
        assert_eq!(JsonShape::of(&a).render(), JsonShape::of(&b).render());
    }
}
