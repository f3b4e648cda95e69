//! Composite relevance metric used to order the frontier.
//!
//! `metric = w_sim * similarity + w_recency * decay(age) - w_depth * depth`
//! where `decay(age) = 1 / (1 + age / window)`. The metric is computed once
//! at enqueue time (age zero, so the recency term starts at its weight) and
//! never mutated; a re-enqueue replaces the task outright.

use chrono::{DateTime, Utc};

use crate::config::CrawlerConfig;

/// The three metric weights plus the recency window, copied out of the
/// config so the frontier does not need the whole thing.
#[derive(Debug, Clone, Copy)]
pub struct MetricWeights {
    pub similarity: f64,
    pub recency: f64,
    pub depth: f64,
    pub recency_window_secs: u64,
}

impl MetricWeights {
    #[must_use]
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            similarity: config.weight_similarity(),
            recency: config.weight_recency(),
            depth: config.weight_depth(),
            recency_window_secs: config.recency_window_secs(),
        }
    }

    /// Recency decay for a task enqueued at `enqueued_at`, evaluated at `now`.
    ///
    /// 1.0 for a fresh task, 0.5 once a full window has elapsed.
    #[must_use]
    pub fn decay(&self, enqueued_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_secs = (now - enqueued_at).num_milliseconds().max(0) as f64 / 1000.0;
        1.0 / (1.0 + age_secs / self.recency_window_secs as f64)
    }

    /// Compute the composite metric for a candidate task.
    #[must_use]
    pub fn compute(&self, similarity: f64, depth: u32, decay: f64) -> f64 {
        self.similarity * similarity + self.recency * decay - self.depth * f64::from(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn weights() -> MetricWeights {
        MetricWeights {
            similarity: 1.0,
            recency: 1.0,
            depth: 1.0,
            recency_window_secs: 600,
        }
    }

    #[test]
    fn fresh_task_has_full_recency() {
        let w = weights();
        let now = Utc::now();
        assert!((w.decay(now, now) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn decay_halves_after_one_window() {
        let w = weights();
        let now = Utc::now();
        let old = now - Duration::seconds(600);
        assert!((w.decay(old, now) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn depth_penalizes_metric() {
        let w = weights();
        let shallow = w.compute(0.5, 0, 1.0);
        let deep = w.compute(0.5, 2, 1.0);
        assert!(shallow > deep);
        assert!((shallow - deep - 2.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_dominates_equal_depth() {
        let w = weights();
        assert!(w.compute(0.9, 1, 1.0) > w.compute(0.1, 1, 1.0));
    }
}
