//! Single-fetch execution: one bounded-timeout HTTP request, content-type
//! classification, and dispatch to the matching extraction path.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LAST_MODIFIED};
use thiserror::Error;

use crate::collaborators::{ContentExtractor, ResolvedRequest};

use super::json_links::extract_json_links;

/// Fetch failure taxonomy.
///
/// Every variant is recovered locally by the scheduler's domain backoff;
/// none of these ever surface as a hard error to the caller.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch timeout after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("non-success status {0}")]
    Status(u16),
}

/// Structured result of a completed fetch.
///
/// `completed = false` means the fetch itself succeeded but extraction
/// produced nothing worth storing (empty or whitespace-only text). That is
/// distinct from a [`FetchError`].
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub content: String,
    pub links: Vec<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// Broad classification of a response's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    /// JSON payloads: links are pulled by structural traversal.
    Json,
    /// Office / PDF formats: handed whole to the extractor.
    Document,
    /// HTML, XML, and plain text: extractor yields text plus outbound links.
    Text,
    /// Anything else (images, archives) yields no content.
    Binary,
}

impl ContentClass {
    #[must_use]
    pub fn classify(content_type: &str) -> Self {
        let ct = content_type.to_lowercase();
        if ct.contains("json") {
            Self::Json
        } else if ct.contains("pdf")
            || ct.contains("msword")
            || ct.contains("officedocument")
            || ct.contains("opendocument")
        {
            Self::Document
        } else if ct.contains("html") || ct.contains("xml") || ct.starts_with("text/") {
            Self::Text
        } else {
            Self::Binary
        }
    }
}

fn build_headers(request: &ResolvedRequest) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
        match (
            name.parse::<HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => debug!("Skipping unrepresentable header '{name}'"),
        }
    }
    headers
}

fn parse_last_modified(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Perform one fetch with an independent timeout.
///
/// The request is aborted once `timeout` elapses and reported as
/// [`FetchError::Timeout`].
pub async fn fetch_once(
    client: &reqwest::Client,
    request: &ResolvedRequest,
    timeout: Duration,
    extractor: &dyn ContentExtractor,
) -> Result<FetchOutcome, FetchError> {
    let fetch = async {
        let response = client
            .get(&request.url)
            .headers(build_headers(request))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        let header_last_modified = parse_last_modified(response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok((content_type, header_last_modified, bytes))
    };

    let (content_type, header_last_modified, bytes) = tokio::time::timeout(timeout, fetch)
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    let outcome = match ContentClass::classify(&content_type) {
        ContentClass::Json => {
            let content = String::from_utf8_lossy(&bytes).into_owned();
            let links = serde_json::from_str(&content)
                .map(|value| extract_json_links(&value))
                .unwrap_or_default();
            FetchOutcome {
                completed: !content.trim().is_empty(),
                content,
                links,
                last_modified: header_last_modified,
            }
        }
        ContentClass::Document | ContentClass::Text => {
            let extraction = extractor.extract(&bytes, &content_type, &request.url);
            FetchOutcome {
                completed: !extraction.text.trim().is_empty(),
                content: extraction.text,
                links: extraction.links,
                last_modified: extraction.last_modified.or(header_last_modified),
            }
        }
        ContentClass::Binary => {
            debug!("Skipping binary content type '{content_type}' at {}", request.url);
            FetchOutcome::default()
        }
    };

    Ok(outcome)
}
