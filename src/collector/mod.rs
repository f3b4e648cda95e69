//! The endpoint collector: offline analysis of accumulated traffic
//! observations into reusable Tools.
//!
//! Runs on demand. Each run is a fresh derivation over the full observation
//! log: URLs are deduplicated within the run, paths are generalized against
//! their response payloads, and endpoints cluster into Tools by
//! `(pattern, schema signature)`. Arrival order never changes the final
//! grouping.

pub mod observation;
pub mod signature;
pub mod template;
pub mod tools;

use std::collections::HashSet;

use log::debug;
use serde_json::Value;
use url::Url;

pub use observation::{NetworkObservation, ObservationLog};
pub use signature::{schema_signature, JsonShape};
pub use template::{classify_param, collect_keys, generalize_path, ParamClass};
pub use tools::{generate_tool_definitions, EndpointDescriptor, Tool};

/// Stateless analyzer; construct once, run `collect` per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointCollector;

impl EndpointCollector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Generalize one observation into an endpoint descriptor.
    ///
    /// Returns `None` for unparseable URLs; observations without a response
    /// body still participate (their payload key set is just empty).
    #[must_use]
    pub fn process_endpoint(&self, obs: &NetworkObservation) -> Option<EndpointDescriptor> {
        let url = Url::parse(&obs.url).ok()?;

        let request_json: Option<Value> = obs
            .request_body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok());
        let response_json: Option<Value> = obs
            .response_body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok());

        let response_keys = response_json
            .as_ref()
            .map(collect_keys)
            .unwrap_or_default();

        let (template, segments) = generalize_path(url.path(), &response_keys);

        let query_params = url
            .query_pairs()
            .map(|(name, value)| {
                let value = value.into_owned();
                let class = classify_param(&value);
                (name.into_owned(), (value, class))
            })
            .collect();

        Some(EndpointDescriptor {
            url: obs.url.clone(),
            method: obs.method.clone(),
            template,
            segments,
            query_params,
            signature: schema_signature(request_json.as_ref(), response_json.as_ref()),
        })
    }

    /// Cluster observations into Tools.
    ///
    /// An endpoint joins the first Tool sharing its `(pattern, signature)`;
    /// otherwise a new Tool is created, named after the path's first
    /// segment (with a numeric suffix on collision).
    #[must_use]
    pub fn collect(&self, observations: &[NetworkObservation]) -> Vec<Tool> {
        let mut processed: HashSet<&str> = HashSet::new();
        let mut tools: Vec<Tool> = Vec::new();

        for obs in observations {
            if !processed.insert(obs.url.as_str()) {
                continue;
            }

            let Some(endpoint) = self.process_endpoint(obs) else {
                debug!("Skipping unparseable observation URL: {}", obs.url);
                continue;
            };

            if let Some(tool) = tools.iter_mut().find(|t| t.matches(&endpoint)) {
                tool.absorb(endpoint);
            } else {
                let base = endpoint
                    .segments
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "root".to_string());
                let name = unique_name(&base, &tools);
                tools.push(Tool::new(name, endpoint));
            }
        }

        tools
    }
}

fn unique_name(base: &str, tools: &[Tool]) -> String {
    if !tools.iter().any(|t| t.name == base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !tools.iter().any(|t| t.name == candidate) {
            return candidate;
        }
        n += 1;
    }
}
