//! Tools: generalized, parameterized API endpoints inferred from traffic.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::utils::constants::{ENUM_OPTION_CUTOFF, MAX_PARAM_EXAMPLES};

use super::template::ParamClass;

/// One observed endpoint after generalization.
///
/// Derived fresh on each collection run; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub url: String,
    pub method: String,
    /// Generalized template, e.g. `/stocks/:param1/price`.
    pub template: String,
    /// Concrete path segments backing the template's placeholders.
    pub segments: Vec<String>,
    /// Query parameter name → (observed value, classification).
    pub query_params: BTreeMap<String, (String, ParamClass)>,
    /// Structural fingerprint of request + response shapes.
    pub signature: String,
}

/// A reusable API endpoint template plus everything observed through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub pattern: String,
    pub schema_signature: String,
    pub endpoints: Vec<EndpointDescriptor>,
    /// Per-parameter union of observed values, deduplicated.
    pub query_param_options: BTreeMap<String, BTreeSet<String>>,
}

impl Tool {
    #[must_use]
    pub fn new(name: String, endpoint: EndpointDescriptor) -> Self {
        let mut tool = Self {
            name,
            pattern: endpoint.template.clone(),
            schema_signature: endpoint.signature.clone(),
            endpoints: Vec::new(),
            query_param_options: BTreeMap::new(),
        };
        tool.absorb(endpoint);
        tool
    }

    /// Whether this tool is the home for an endpoint: same generalized
    /// pattern and same schema signature.
    #[must_use]
    pub fn matches(&self, endpoint: &EndpointDescriptor) -> bool {
        self.pattern == endpoint.template && self.schema_signature == endpoint.signature
    }

    /// Add an endpoint, unioning its query-parameter values into the
    /// tool's per-parameter option sets.
    pub fn absorb(&mut self, endpoint: EndpointDescriptor) {
        for (name, (value, _)) in &endpoint.query_params {
            self.query_param_options
                .entry(name.clone())
                .or_default()
                .insert(value.clone());
        }
        self.endpoints.push(endpoint);
    }

    /// Example values observed at a placeholder's segment position.
    fn placeholder_examples(&self, position: usize) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut examples = Vec::new();
        for endpoint in &self.endpoints {
            if let Some(value) = endpoint.segments.get(position) {
                if seen.insert(value.clone()) {
                    examples.push(value.clone());
                    if examples.len() >= MAX_PARAM_EXAMPLES {
                        break;
                    }
                }
            }
        }
        examples
    }
}

/// Derive a machine-usable definition for each tool: a JSON-Schema-like
/// parameter spec the assistant's tool-invocation layer can consume.
///
/// Path placeholders become required string parameters with example values;
/// query parameters with few distinct observed values become enumerations,
/// the rest free strings annotated with examples.
#[must_use]
pub fn generate_tool_definitions(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            let mut properties = serde_json::Map::new();
            let mut required = Vec::new();

            for (position, segment) in tool.pattern.trim_matches('/').split('/').enumerate() {
                let Some(name) = segment.strip_prefix(':') else {
                    continue;
                };
                let examples = tool.placeholder_examples(position);
                properties.insert(
                    name.to_string(),
                    json!({
                        "type": "string",
                        "examples": examples,
                    }),
                );
                required.push(name.to_string());
            }

            for (name, values) in &tool.query_param_options {
                let spec = if values.len() <= ENUM_OPTION_CUTOFF {
                    json!({
                        "type": "string",
                        "enum": values.iter().collect::<Vec<_>>(),
                    })
                } else {
                    json!({
                        "type": "string",
                        "examples": values.iter().take(MAX_PARAM_EXAMPLES).collect::<Vec<_>>(),
                    })
                };
                properties.insert(name.clone(), spec);
            }

            json!({
                "name": tool.name,
                "pattern": tool.pattern,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            })
        })
        .collect()
}
