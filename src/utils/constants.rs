//! Shared configuration constants for scopecrawl
//!
//! This module contains default values used throughout the codebase to
//! ensure consistency and avoid magic numbers.

/// Default maximum crawl depth: 3 levels
///
/// Limits how deep the crawler will follow links from a seed URL. Links
/// discovered beyond this depth are never enqueued.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Default frontier capacity: 500 pending tasks
///
/// When an enqueue would push the frontier past this bound, the single
/// lowest-metric task is evicted first.
pub const DEFAULT_FRONTIER_CAPACITY: usize = 500;

/// Default content store capacity: 1000 records
///
/// When the store is at capacity, the single oldest record (by timestamp)
/// is evicted before a new insert.
pub const DEFAULT_STORE_CAPACITY: usize = 1000;

/// Minimum length for content to be considered useful: 50 characters
///
/// Shorter payloads are almost always error pages, redirects, or boilerplate
/// and are rejected by the store instead of occupying a record slot.
pub const DEFAULT_MIN_CONTENT_LEN: usize = 50;

/// Maximum length of a single whitespace-delimited token in JSON content
///
/// A single token longer than this is almost certainly an embedded base64
/// blob; such content is rejected by the store's usefulness predicate.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 1000;

/// Maximum stored content length: 50k characters
///
/// Content is truncated to this length before insert so a single page cannot
/// dominate the store's memory.
pub const DEFAULT_MAX_CONTENT_LEN: usize = 50_000;

/// Front buffer size: 64 records
///
/// Most-recently-added records are held in memory for low-latency re-reads;
/// everything is also written through to the backing store.
pub const DEFAULT_FRONT_BUFFER_SIZE: usize = 64;

/// Default fetch worker count
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Default worker pool backlog bound
///
/// `submit` blocks the caller once this many submissions are pending.
pub const DEFAULT_BACKLOG_LIMIT: usize = 30;

/// Default per-fetch timeout in milliseconds
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 3000;

/// Recency decay window in seconds: 10 minutes
///
/// The recency term of the task metric is `1 / (1 + age / window)`, so a
/// task enqueued `window` seconds ago contributes half its recency weight.
pub const DEFAULT_RECENCY_WINDOW_SECS: u64 = 600;

/// Default metric weights
pub const DEFAULT_WEIGHT_SIMILARITY: f64 = 1.0;
pub const DEFAULT_WEIGHT_RECENCY: f64 = 1.0;
pub const DEFAULT_WEIGHT_DEPTH: f64 = 1.0;

/// Fixed similarity score assigned to active-query seed URLs
///
/// High enough that seeds always outrank the existing backlog, whose
/// similarity term is bounded by 1.0.
pub const SEED_SIMILARITY: f64 = 5.0;

/// Maximum number of seed URLs accepted per active-query change
pub const MAX_SEED_URLS: usize = 20;

/// Query parameter values at or below this length classify as `enum`
///
/// Longer values imply an identifier or free-text input (`dynamic`).
pub const ENUM_VALUE_MAX_LEN: usize = 5;

/// Query parameters with at most this many distinct observed values become
/// enumerated parameters in generated tool definitions.
pub const ENUM_OPTION_CUTOFF: usize = 5;

/// Maximum example values attached to a generated tool parameter
pub const MAX_PARAM_EXAMPLES: usize = 5;

/// Lines of surrounding text on each side of an anchor used to seed a
/// discovered link's similarity score.
pub const LINK_CONTEXT_LINES: usize = 2;
