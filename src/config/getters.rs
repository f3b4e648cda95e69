//! Getter methods for `CrawlerConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from a `CrawlerConfig` instance.

use std::path::PathBuf;
use std::time::Duration;

use super::types::CrawlerConfig;

impl CrawlerConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[must_use]
    pub fn frontier_capacity(&self) -> usize {
        self.frontier_capacity
    }

    #[must_use]
    pub fn store_capacity(&self) -> usize {
        self.store_capacity
    }

    #[must_use]
    pub fn min_content_len(&self) -> usize {
        self.min_content_len
    }

    #[must_use]
    pub fn max_token_len(&self) -> usize {
        self.max_token_len
    }

    #[must_use]
    pub fn max_content_len(&self) -> usize {
        self.max_content_len
    }

    #[must_use]
    pub fn front_buffer_size(&self) -> usize {
        self.front_buffer_size
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    #[must_use]
    pub fn backlog_limit(&self) -> usize {
        self.backlog_limit
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    #[must_use]
    pub fn recency_window_secs(&self) -> u64 {
        self.recency_window_secs
    }

    #[must_use]
    pub fn weight_similarity(&self) -> f64 {
        self.weight_similarity
    }

    #[must_use]
    pub fn weight_recency(&self) -> f64 {
        self.weight_recency
    }

    #[must_use]
    pub fn weight_depth(&self) -> f64 {
        self.weight_depth
    }

    #[must_use]
    pub fn seed_similarity(&self) -> f64 {
        self.seed_similarity
    }

    #[must_use]
    pub fn max_seed_urls(&self) -> usize {
        self.max_seed_urls
    }
}
