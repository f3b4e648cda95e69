//! The prioritized frontier of URLs awaiting a fetch.
//!
//! Memory-tiered: the tasks live in a metric-sorted in-memory vector; every
//! mutation writes through to a sqlite queue table so a restart resumes
//! where the previous process stopped. The stored metric is the value at
//! enqueue time; ordering decisions re-evaluate the recency decay against
//! each task's age, so stale backlog entries fall behind fresher ones.
//! Capacity is enforced by evicting the single lowest-metric entry.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::db;
use crate::utils::extract_host;

use super::metric::MetricWeights;

/// Metrics closer than this are ties for host-diversity purposes.
const METRIC_TIE_EPSILON: f64 = 1e-6;

/// SQL schema for the persistent queue
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS crawl_queue (
    url TEXT PRIMARY KEY,
    host TEXT NOT NULL,
    depth INTEGER NOT NULL,
    enqueue_time INTEGER NOT NULL,
    similarity REAL NOT NULL,
    metric REAL NOT NULL,
    parent_context TEXT
);

CREATE INDEX IF NOT EXISTS idx_queue_metric ON crawl_queue(metric);
CREATE INDEX IF NOT EXISTS idx_queue_time ON crawl_queue(enqueue_time);
CREATE INDEX IF NOT EXISTS idx_queue_depth ON crawl_queue(depth);
";

const DB_FILE: &str = "crawl_queue.sqlite";

/// One pending crawl task. Identity is the normalized URL; tasks are never
/// mutated in place, a re-enqueue replaces the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    pub url: String,
    pub host: String,
    pub depth: u32,
    pub enqueue_time: DateTime<Utc>,
    pub similarity: f64,
    pub metric: f64,
    pub parent_context: Option<String>,
}

/// Metric-ordered persistent work queue.
pub struct Frontier {
    pool: SqlitePool,
    /// Sorted by metric descending; ties keep insertion order.
    tasks: Vec<CrawlTask>,
    capacity: usize,
    weights: MetricWeights,
}

/// A task's metric with the recency lost since enqueue subtracted out.
///
/// The stored metric was computed with decay 1.0 (age zero), so aging only
/// needs the recency weight and window, not the full similarity/depth terms.
fn effective_metric(weights: &MetricWeights, task: &CrawlTask, now: DateTime<Utc>) -> f64 {
    task.metric - weights.recency * (1.0 - weights.decay(task.enqueue_time, now))
}

impl Frontier {
    /// Open the queue, reloading any tasks persisted by a previous run.
    pub async fn open(
        storage_dir: &std::path::Path,
        capacity: usize,
        weights: MetricWeights,
    ) -> Result<Self> {
        let pool = db::open_or_recover(storage_dir, DB_FILE, SCHEMA_SQL).await?;

        let rows = sqlx::query("SELECT * FROM crawl_queue ORDER BY metric DESC")
            .fetch_all(&pool)
            .await
            .context("Failed to load persisted queue")?;

        let tasks: Vec<CrawlTask> = rows
            .iter()
            .map(|row| {
                let depth: i64 = row.get("depth");
                let enqueue_time: i64 = row.get("enqueue_time");
                CrawlTask {
                    url: row.get("url"),
                    host: row.get("host"),
                    depth: depth.max(0) as u32,
                    enqueue_time: DateTime::<Utc>::from_timestamp_millis(enqueue_time)
                        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                    similarity: row.get("similarity"),
                    metric: row.get("metric"),
                    parent_context: row.get("parent_context"),
                }
            })
            .collect();

        if !tasks.is_empty() {
            debug!("Resumed frontier with {} persisted tasks", tasks.len());
        }

        Ok(Self {
            pool,
            tasks,
            capacity,
            weights,
        })
    }

    /// Build a task, deriving its host from the (already normalized) URL.
    pub fn make_task(
        url: String,
        depth: u32,
        similarity: f64,
        metric: f64,
        parent_context: Option<String>,
    ) -> Result<CrawlTask> {
        let host = extract_host(&url)?;
        Ok(CrawlTask {
            url,
            host,
            depth,
            enqueue_time: Utc::now(),
            similarity,
            metric,
            parent_context,
        })
    }

    /// Insert a task keyed by metric, replacing any existing entry for the
    /// same URL. Evicts the lowest-metric entry when over capacity (which
    /// may be the task just inserted).
    pub async fn insert(&mut self, task: CrawlTask) -> Result<()> {
        if let Some(existing) = self.tasks.iter().position(|t| t.url == task.url) {
            self.tasks.remove(existing);
        }

        sqlx::query(
            "INSERT OR REPLACE INTO crawl_queue
             (url, host, depth, enqueue_time, similarity, metric, parent_context)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.url)
        .bind(&task.host)
        .bind(i64::from(task.depth))
        .bind(task.enqueue_time.timestamp_millis())
        .bind(task.similarity)
        .bind(task.metric)
        .bind(&task.parent_context)
        .execute(&self.pool)
        .await
        .context("Failed to persist queued task")?;

        let idx = self.tasks.partition_point(|t| t.metric > task.metric);
        self.tasks.insert(idx, task);

        if self.tasks.len() > self.capacity {
            if let Some(evicted) = self.tasks.pop() {
                debug!(
                    "Frontier over capacity, evicting lowest-metric task {} ({:.3})",
                    evicted.url, evicted.metric
                );
                self.delete_row(&evicted.url).await?;
            }
        }
        Ok(())
    }

    /// Pop the task with the highest effective metric.
    ///
    /// The backlog is re-ranked first with each task's recency decayed by
    /// its age, so an entry that has sat through a recency window falls
    /// behind an otherwise-identical fresh one. Among tasks tied with the
    /// head, prefers one whose host differs from `prev_host` so a single
    /// domain does not starve the others.
    pub async fn pop(&mut self, prev_host: Option<&str>) -> Result<Option<CrawlTask>> {
        if self.tasks.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let weights = self.weights;
        // Stable sort: tasks with equal effective metrics keep their order.
        self.tasks.sort_by(|a, b| {
            let ea = effective_metric(&weights, a, now);
            let eb = effective_metric(&weights, b, now);
            eb.partial_cmp(&ea).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut chosen = 0;
        if let Some(prev) = prev_host {
            if self.tasks[0].host == prev {
                let head_metric = effective_metric(&weights, &self.tasks[0], now);
                for (i, task) in self.tasks.iter().enumerate().skip(1) {
                    if (head_metric - effective_metric(&weights, task, now)).abs()
                        > METRIC_TIE_EPSILON
                    {
                        break;
                    }
                    if task.host != prev {
                        chosen = i;
                        break;
                    }
                }
            }
        }

        let task = self.tasks.remove(chosen);
        self.delete_row(&task.url).await?;
        Ok(Some(task))
    }

    /// Drop every still-queued task whose host matches `host`.
    ///
    /// Called after a fetch failure so an unreachable domain cannot burn the
    /// rest of the queue generation.
    pub async fn purge_host(&mut self, host: &str) -> Result<usize> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.host != host);
        let purged = before - self.tasks.len();

        if purged > 0 {
            warn!("Purged {purged} queued tasks for failing host {host}");
        }

        sqlx::query("DELETE FROM crawl_queue WHERE host = ?")
            .bind(host)
            .execute(&self.pool)
            .await
            .context("Failed to purge host from persisted queue")?;

        Ok(purged)
    }

    async fn delete_row(&self, url: &str) -> Result<()> {
        sqlx::query("DELETE FROM crawl_queue WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await
            .context("Failed to delete queued task")?;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.tasks.iter().any(|t| t.url == url)
    }
}
