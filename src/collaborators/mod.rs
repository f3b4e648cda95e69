//! External collaborator seams.
//!
//! The crawler consumes three capabilities it deliberately does not own:
//! auth header resolution, raw-bytes-to-text extraction, and text
//! similarity scoring. Each is a trait so hosts inject their real
//! implementations; the no-op and demo implementations here keep the demo
//! binary and the test suite self-contained.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// A URL plus the headers a fetch of it should carry.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// Supplies cookies / user-agent / auth headers for a fetch.
pub trait AuthResolver: Send + Sync {
    fn resolve(&self, url: &str) -> ResolvedRequest;
}

/// Result of extracting text and links from fetched bytes.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub text: String,
    pub links: Vec<String>,
    pub title: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Converts raw fetched bytes into text plus outbound links.
///
/// HTML-to-markdown conversion, PDF/office text extraction, and link
/// resolution all live behind this seam.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], content_type: &str, base_url: &str) -> Extraction;
}

/// Scores text relevance against the active query, in [0, 1].
pub trait Similarity: Send + Sync {
    fn score(&self, query: &str, text: &str) -> f64;
}

/// Auth resolver that adds no headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthResolver for NoAuth {
    fn resolve(&self, url: &str) -> ResolvedRequest {
        ResolvedRequest {
            url: url.to_string(),
            headers: HashMap::new(),
        }
    }
}

/// Similarity that scores everything zero.
///
/// With no active query every task falls back to recency and depth ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSimilarity;

impl Similarity for NoSimilarity {
    #[inline(always)]
    fn score(&self, _query: &str, _text: &str) -> f64 {
        0.0
    }
}

/// Token-overlap similarity for the demo binary and tests.
///
/// Jaccard overlap of lowercased alphanumeric tokens. Production hosts
/// inject an embedding-based scorer instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapSimilarity;

fn tokenize(text: &str) -> std::collections::HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

impl Similarity for TokenOverlapSimilarity {
    fn score(&self, query: &str, text: &str) -> f64 {
        let q = tokenize(query);
        let t = tokenize(text);
        if q.is_empty() || t.is_empty() {
            return 0.0;
        }
        let intersection = q.intersection(&t).count() as f64;
        let union = q.union(&t).count() as f64;
        (intersection / union).clamp(0.0, 1.0)
    }
}

// Literal patterns compiled once at first use.
static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href\s*=\s*["']([^"'#]+)["']"#).expect("valid href regex"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Minimal HTML extractor for the demo binary and tests.
///
/// Strips tags for the text body and resolves `href` attributes against the
/// base URL. Not a substitute for a real markdown converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl ContentExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], content_type: &str, base_url: &str) -> Extraction {
        let body = String::from_utf8_lossy(bytes);

        if !content_type.contains("html") {
            return Extraction {
                text: body.into_owned(),
                ..Extraction::default()
            };
        }

        let base = url::Url::parse(base_url).ok();
        let links = HREF_RE
            .captures_iter(&body)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .filter_map(|href| match &base {
                Some(base) => base.join(href).ok().map(String::from),
                None => url::Url::parse(href).ok().map(String::from),
            })
            .collect();

        let text = TAG_RE.replace_all(&body, " ");
        let text = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Extraction {
            text,
            links,
            title: None,
            last_modified: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_overlap_scores_related_text_higher() {
        let sim = TokenOverlapSimilarity;
        let related = sim.score("stock price history", "historical stock price charts");
        let unrelated = sim.score("stock price history", "cooking pasta recipes tonight");
        assert!(related > unrelated);
        assert!((0.0..=1.0).contains(&related));
    }

    #[test]
    fn plain_text_extractor_resolves_relative_links() {
        let html = br#"<html><body><p>Hello</p><a href="/docs">Docs</a></body></html>"#;
        let out = PlainTextExtractor.extract(html, "text/html", "https://a.test/start");
        assert_eq!(out.links, vec!["https://a.test/docs".to_string()]);
        assert!(out.text.contains("Hello"));
        assert!(!out.text.contains('<'));
    }

    #[test]
    fn plain_text_extractor_passes_through_non_html() {
        let out = PlainTextExtractor.extract(b"just text", "text/plain", "https://a.test/");
        assert_eq!(out.text, "just text");
        assert!(out.links.is_empty());
    }
}
