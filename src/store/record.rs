//! Stored crawl record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One archived crawl result.
///
/// At most one record exists per normalized URL. Once `ingested` is set the
/// `content` field is cleared to bound memory, but the record itself stays
/// so the URL is never re-crawled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub url_hash: String,
    pub url: String,
    pub content_hash: String,
    pub content: String,
    pub depth: u32,
    pub last_modified: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
    pub similarity: f64,
    pub metric: f64,
    pub ingested: bool,
}

/// Result of a store insert attempt.
///
/// Rejections are ordinary outcomes, not errors; only I/O faults surface
/// through `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Record inserted.
    Stored,
    /// A record for this normalized URL already exists.
    Duplicate,
    /// Content failed the usefulness predicate.
    NotUseful,
}

impl AddOutcome {
    #[must_use]
    pub fn is_stored(self) -> bool {
        matches!(self, Self::Stored)
    }
}
