//! URL normalization used as the dedup identity across the crawler.
//!
//! A normalized URL has its fragment removed and tracking query parameters
//! stripped, so `https://a.test/x?utm_source=y` and `https://a.test/x`
//! collapse to the same frontier/store key.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use url::Url;

/// Internal pseudo-scheme used to key caller-supplied raw content.
pub const INTERNAL_SCHEME: &str = "internal";

/// Query parameters that never affect page identity.
static TRACKING_PARAMS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "gclid", "fbclid", "msclkid", "mc_cid", "mc_eid", "ref", "igshid",
    ]
});

fn is_tracking_param(name: &str) -> bool {
    name.starts_with("utm_") || TRACKING_PARAMS.iter().any(|p| *p == name)
}

/// Check whether a URL's scheme is allowed for crawling.
///
/// Only secure HTTP and the internal pseudo-scheme are permitted; everything
/// else (plain http, javascript:, data:, mailto:, ...) is rejected.
#[must_use]
pub fn is_allowed_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "https") || url.scheme() == INTERNAL_SCHEME
}

/// Normalize a URL string into the canonical dedup key.
///
/// Strips the fragment and every tracking query parameter, and rejects URLs
/// with disallowed schemes.
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| anyhow!("Failed to parse URL {raw}: {e}"))?;

    if !is_allowed_scheme(&url) {
        return Err(anyhow!("Disallowed scheme '{}' in URL {raw}", url.scheme()));
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !is_tracking_param(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &kept {
            serializer.append_pair(name, value);
        }
        url.set_query(Some(&serializer.finish()));
    }

    Ok(url.to_string())
}

/// Extract the host portion of a URL string.
///
/// Content seeded through the internal pseudo-scheme has no meaningful host;
/// the scheme itself is returned so domain purges never touch it.
pub fn extract_host(url_str: &str) -> Result<String> {
    let url = Url::parse(url_str).map_err(|e| anyhow!("Failed to parse URL {url_str}: {e}"))?;
    if url.scheme() == INTERNAL_SCHEME {
        return Ok(INTERNAL_SCHEME.to_string());
    }
    url.host_str()
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("URL has no host: {url_str}"))
}
