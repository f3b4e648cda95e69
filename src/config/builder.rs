//! Type-safe builder for `CrawlerConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time
//! validation ensuring the storage directory is set before building.

use anyhow::{Context, Result};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::CrawlerConfig;
use crate::utils::constants::{
    DEFAULT_BACKLOG_LIMIT, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_FRONTIER_CAPACITY,
    DEFAULT_FRONT_BUFFER_SIZE, DEFAULT_MAX_CONTENT_LEN, DEFAULT_MAX_DEPTH, DEFAULT_MAX_TOKEN_LEN,
    DEFAULT_MIN_CONTENT_LEN, DEFAULT_RECENCY_WINDOW_SECS, DEFAULT_STORE_CAPACITY,
    DEFAULT_WEIGHT_DEPTH, DEFAULT_WEIGHT_RECENCY, DEFAULT_WEIGHT_SIMILARITY,
    DEFAULT_WORKER_COUNT, MAX_SEED_URLS, SEED_SIMILARITY,
};

// Type states for the builder
pub struct WithStorageDir;

pub struct CrawlerConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) max_depth: u32,
    pub(crate) frontier_capacity: usize,
    pub(crate) store_capacity: usize,
    pub(crate) min_content_len: usize,
    pub(crate) max_token_len: usize,
    pub(crate) max_content_len: usize,
    pub(crate) front_buffer_size: usize,
    pub(crate) worker_count: usize,
    pub(crate) backlog_limit: usize,
    pub(crate) fetch_timeout_ms: u64,
    pub(crate) recency_window_secs: u64,
    pub(crate) weight_similarity: f64,
    pub(crate) weight_recency: f64,
    pub(crate) weight_depth: f64,
    pub(crate) seed_similarity: f64,
    pub(crate) max_seed_urls: usize,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlerConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            max_depth: DEFAULT_MAX_DEPTH,
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
            store_capacity: DEFAULT_STORE_CAPACITY,
            min_content_len: DEFAULT_MIN_CONTENT_LEN,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            max_content_len: DEFAULT_MAX_CONTENT_LEN,
            front_buffer_size: DEFAULT_FRONT_BUFFER_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            backlog_limit: DEFAULT_BACKLOG_LIMIT,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            recency_window_secs: DEFAULT_RECENCY_WINDOW_SECS,
            weight_similarity: DEFAULT_WEIGHT_SIMILARITY,
            weight_recency: DEFAULT_WEIGHT_RECENCY,
            weight_depth: DEFAULT_WEIGHT_DEPTH,
            seed_similarity: SEED_SIMILARITY,
            max_seed_urls: MAX_SEED_URLS,
            _phantom: PhantomData,
        }
    }
}

impl CrawlerConfig {
    /// Create a builder for configuring a `CrawlerConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlerConfigBuilder<()> {
        CrawlerConfigBuilder::default()
    }
}

impl CrawlerConfigBuilder<()> {
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> CrawlerConfigBuilder<WithStorageDir> {
        CrawlerConfigBuilder {
            storage_dir: Some(dir.into()),
            max_depth: self.max_depth,
            frontier_capacity: self.frontier_capacity,
            store_capacity: self.store_capacity,
            min_content_len: self.min_content_len,
            max_token_len: self.max_token_len,
            max_content_len: self.max_content_len,
            front_buffer_size: self.front_buffer_size,
            worker_count: self.worker_count,
            backlog_limit: self.backlog_limit,
            fetch_timeout_ms: self.fetch_timeout_ms,
            recency_window_secs: self.recency_window_secs,
            weight_similarity: self.weight_similarity,
            weight_recency: self.weight_recency,
            weight_depth: self.weight_depth,
            seed_similarity: self.seed_similarity,
            max_seed_urls: self.max_seed_urls,
            _phantom: PhantomData,
        }
    }
}

impl<State> CrawlerConfigBuilder<State> {
    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn frontier_capacity(mut self, capacity: usize) -> Self {
        self.frontier_capacity = capacity;
        self
    }

    #[must_use]
    pub fn store_capacity(mut self, capacity: usize) -> Self {
        self.store_capacity = capacity;
        self
    }

    #[must_use]
    pub fn min_content_len(mut self, len: usize) -> Self {
        self.min_content_len = len;
        self
    }

    #[must_use]
    pub fn max_token_len(mut self, len: usize) -> Self {
        self.max_token_len = len;
        self
    }

    #[must_use]
    pub fn max_content_len(mut self, len: usize) -> Self {
        self.max_content_len = len;
        self
    }

    #[must_use]
    pub fn front_buffer_size(mut self, size: usize) -> Self {
        self.front_buffer_size = size;
        self
    }

    #[must_use]
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    #[must_use]
    pub fn backlog_limit(mut self, limit: usize) -> Self {
        self.backlog_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn fetch_timeout_ms(mut self, ms: u64) -> Self {
        self.fetch_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn recency_window_secs(mut self, secs: u64) -> Self {
        self.recency_window_secs = secs.max(1);
        self
    }

    #[must_use]
    pub fn weights(mut self, similarity: f64, recency: f64, depth: f64) -> Self {
        self.weight_similarity = similarity;
        self.weight_recency = recency;
        self.weight_depth = depth;
        self
    }

    #[must_use]
    pub fn seed_similarity(mut self, score: f64) -> Self {
        self.seed_similarity = score;
        self
    }

    #[must_use]
    pub fn max_seed_urls(mut self, count: usize) -> Self {
        self.max_seed_urls = count;
        self
    }
}

impl CrawlerConfigBuilder<WithStorageDir> {
    /// Build the final configuration.
    ///
    /// Normalizes `storage_dir` to an absolute path so every component
    /// resolves the same database files regardless of working directory.
    pub fn build(self) -> Result<CrawlerConfig> {
        // Typestate guarantees this is Some; propagate rather than panic anyway.
        let storage_dir = self
            .storage_dir
            .context("storage_dir missing from builder")?;

        let storage_dir = if storage_dir.is_absolute() {
            storage_dir
        } else {
            std::env::current_dir()
                .context("Failed to resolve current directory")?
                .join(storage_dir)
        };

        Ok(CrawlerConfig {
            storage_dir,
            max_depth: self.max_depth,
            frontier_capacity: self.frontier_capacity,
            store_capacity: self.store_capacity,
            min_content_len: self.min_content_len,
            max_token_len: self.max_token_len,
            max_content_len: self.max_content_len,
            front_buffer_size: self.front_buffer_size,
            worker_count: self.worker_count,
            backlog_limit: self.backlog_limit,
            fetch_timeout_ms: self.fetch_timeout_ms,
            recency_window_secs: self.recency_window_secs,
            weight_similarity: self.weight_similarity,
            weight_recency: self.weight_recency,
            weight_depth: self.weight_depth,
            seed_similarity: self.seed_similarity,
            max_seed_urls: self.max_seed_urls,
        })
    }
}
