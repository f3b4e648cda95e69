//! Core configuration types for the crawler
//!
//! This module contains the main `CrawlerConfig` struct that defines every
//! tunable of the scheduler, store, worker pool, and endpoint collector.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct for a crawler instance
///
/// Constructed through [`CrawlerConfig::builder`]; all thresholds and weights
/// here are sane defaults rather than fixed requirements, so hosts can tune
/// them per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Storage directory for the sqlite databases.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) storage_dir: PathBuf,

    /// Maximum crawl depth; links beyond this are never enqueued.
    pub(crate) max_depth: u32,

    /// Maximum number of pending tasks in the frontier.
    pub(crate) frontier_capacity: usize,

    /// Maximum number of records in the content store.
    pub(crate) store_capacity: usize,

    /// Minimum content length accepted by the store.
    pub(crate) min_content_len: usize,

    /// Maximum single-token length accepted for JSON content.
    pub(crate) max_token_len: usize,

    /// Content is truncated to this length before storage.
    pub(crate) max_content_len: usize,

    /// Entries held in the store's in-memory front buffer.
    pub(crate) front_buffer_size: usize,

    /// Number of parallel fetch workers.
    pub(crate) worker_count: usize,

    /// Pending submissions beyond which `submit` blocks.
    pub(crate) backlog_limit: usize,

    /// Per-fetch timeout in milliseconds.
    pub(crate) fetch_timeout_ms: u64,

    /// Recency decay window in seconds.
    pub(crate) recency_window_secs: u64,

    /// Metric weight for the similarity term.
    pub(crate) weight_similarity: f64,

    /// Metric weight for the recency term.
    pub(crate) weight_recency: f64,

    /// Metric weight for the depth penalty.
    pub(crate) weight_depth: f64,

    /// Fixed similarity assigned to active-query seed URLs.
    pub(crate) seed_similarity: f64,

    /// Maximum seed URLs accepted per active-query change.
    pub(crate) max_seed_urls: usize,
}
