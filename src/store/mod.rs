//! Content-addressed, deduplicating archive of crawl results.
//!
//! Sqlite is the backing store; an LRU front buffer holds the most recently
//! added records for low-latency re-reads. All writes go through to sqlite,
//! so the buffer is purely a read accelerator and can be dropped at any
//! time without losing data.

pub mod record;

use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use lru::LruCache;
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;
use xxhash_rust::xxh3::xxh3_64;

use crate::config::CrawlerConfig;
use crate::db;
use crate::utils::normalize_url;

pub use record::{AddOutcome, CrawlRecord};

/// SQL schema for the content store database
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS crawl_records (
    url_hash TEXT PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    content_hash TEXT NOT NULL,
    content TEXT NOT NULL,
    depth INTEGER NOT NULL,
    last_modified INTEGER,
    timestamp INTEGER NOT NULL,
    similarity REAL NOT NULL,
    metric REAL NOT NULL,
    ingested INTEGER NOT NULL DEFAULT 0
);

-- Index for the downstream context pull (uningested, best-first)
CREATE INDEX IF NOT EXISTS idx_records_ingested ON crawl_records(ingested);

-- Index for oldest-first eviction
CREATE INDEX IF NOT EXISTS idx_records_timestamp ON crawl_records(timestamp);
";

const DB_FILE: &str = "content_store.sqlite";

/// Deduplicating, size-bounded archive of fetched content.
#[derive(Clone)]
pub struct ContentStore {
    pool: SqlitePool,
    /// Most-recently-added records for fast repeated lookups.
    buffer: Arc<RwLock<LruCache<String, CrawlRecord>>>,
    capacity: usize,
    min_content_len: usize,
    max_token_len: usize,
    max_content_len: usize,
}

fn hash_hex(input: &str) -> String {
    format!("{:016x}", xxh3_64(input.as_bytes()))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> CrawlRecord {
    let last_modified: Option<i64> = row.get("last_modified");
    let timestamp: i64 = row.get("timestamp");
    let depth: i64 = row.get("depth");
    CrawlRecord {
        url_hash: row.get("url_hash"),
        url: row.get("url"),
        content_hash: row.get("content_hash"),
        content: row.get("content"),
        depth: depth.max(0) as u32,
        last_modified: last_modified.and_then(DateTime::<Utc>::from_timestamp_millis),
        timestamp: DateTime::<Utc>::from_timestamp_millis(timestamp)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        similarity: row.get("similarity"),
        metric: row.get("metric"),
        ingested: row.get::<i64, _>("ingested") != 0,
    }
}

impl ContentStore {
    /// Open (or recover) the store under the configured storage directory.
    pub async fn open(config: &CrawlerConfig) -> Result<Self> {
        let pool = db::open_or_recover(config.storage_dir(), DB_FILE, SCHEMA_SQL).await?;

        let buffer_size = NonZeroUsize::new(config.front_buffer_size().max(1))
            .context("front buffer size must be non-zero")?;

        Ok(Self {
            pool,
            buffer: Arc::new(RwLock::new(LruCache::new(buffer_size))),
            capacity: config.store_capacity(),
            min_content_len: config.min_content_len(),
            max_token_len: config.max_token_len(),
            max_content_len: config.max_content_len(),
        })
    }

    /// The usefulness predicate: short payloads are rejected outright, and
    /// JSON payloads containing a single over-long token (a base64 blob in
    /// practice) are rejected too.
    #[must_use]
    pub fn is_useful(&self, content: &str) -> bool {
        let trimmed = content.trim();
        if trimmed.len() < self.min_content_len {
            return false;
        }
        let looks_json = trimmed.starts_with('{') || trimmed.starts_with('[');
        if looks_json
            && trimmed
                .split_whitespace()
                .any(|token| token.len() > self.max_token_len)
        {
            return false;
        }
        true
    }

    /// Insert a fetched result.
    ///
    /// Rejects duplicates (by normalized URL) and useless content. When the
    /// store is at capacity the single oldest record is evicted first, so
    /// the size bound holds after every add.
    pub async fn add(
        &self,
        url: &str,
        content: &str,
        depth: u32,
        last_modified: Option<DateTime<Utc>>,
        similarity: f64,
        metric: f64,
    ) -> Result<AddOutcome> {
        if !self.is_useful(content) {
            debug!("Store rejected content for {url}: not useful");
            return Ok(AddOutcome::NotUseful);
        }

        let normalized = normalize_url(url)?;
        if self.has(&normalized).await? {
            return Ok(AddOutcome::Duplicate);
        }

        if self.size().await? >= self.capacity as u64 {
            self.evict_oldest().await?;
        }

        let truncated: String = content.chars().take(self.max_content_len).collect();
        let record = CrawlRecord {
            url_hash: hash_hex(&normalized),
            url: normalized.clone(),
            content_hash: hash_hex(&truncated),
            content: truncated,
            depth,
            last_modified,
            timestamp: Utc::now(),
            similarity,
            metric,
            ingested: false,
        };

        sqlx::query(
            "INSERT INTO crawl_records
             (url_hash, url, content_hash, content, depth, last_modified,
              timestamp, similarity, metric, ingested)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(&record.url_hash)
        .bind(&record.url)
        .bind(&record.content_hash)
        .bind(&record.content)
        .bind(i64::from(record.depth))
        .bind(record.last_modified.map(|t| t.timestamp_millis()))
        .bind(record.timestamp.timestamp_millis())
        .bind(record.similarity)
        .bind(record.metric)
        .execute(&self.pool)
        .await
        .context("Failed to insert crawl record")?;

        self.buffer.write().await.put(normalized, record);
        Ok(AddOutcome::Stored)
    }

    /// Flip `ingested` and clear the content, keeping the record so the URL
    /// is never re-queued. Idempotent; returns false when no record exists.
    pub async fn mark_ingested(&self, url: &str) -> Result<bool> {
        let normalized = normalize_url(url)?;

        let result = sqlx::query(
            "UPDATE crawl_records SET ingested = 1, content = '' WHERE url = ?",
        )
        .bind(&normalized)
        .execute(&self.pool)
        .await
        .context("Failed to mark record ingested")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let mut buffer = self.buffer.write().await;
        if let Some(record) = buffer.get_mut(&normalized) {
            record.ingested = true;
            record.content.clear();
        }
        Ok(true)
    }

    /// Up to `limit` uningested records, best metric first, newest first
    /// among equals.
    pub async fn get_uningested(&self, limit: usize) -> Result<Vec<CrawlRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM crawl_records WHERE ingested = 0
             ORDER BY metric DESC, timestamp DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query uningested records")?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Look up a record by normalized URL, checking the front buffer first.
    pub async fn get(&self, url: &str) -> Result<Option<CrawlRecord>> {
        let normalized = normalize_url(url)?;

        {
            let mut buffer = self.buffer.write().await;
            if let Some(record) = buffer.get(&normalized) {
                return Ok(Some(record.clone()));
            }
        }

        let row = sqlx::query("SELECT * FROM crawl_records WHERE url = ?")
            .bind(&normalized)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query crawl record")?;

        Ok(row.as_ref().map(row_to_record))
    }

    /// Whether a record exists for this normalized URL.
    pub async fn has(&self, url: &str) -> Result<bool> {
        let normalized = normalize_url(url)?;

        if self.buffer.read().await.contains(&normalized) {
            return Ok(true);
        }

        let row = sqlx::query("SELECT 1 FROM crawl_records WHERE url = ? LIMIT 1")
            .bind(&normalized)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to probe crawl record")?;

        Ok(row.is_some())
    }

    /// Every record in the store, newest first.
    pub async fn get_all(&self) -> Result<Vec<CrawlRecord>> {
        let rows = sqlx::query("SELECT * FROM crawl_records ORDER BY timestamp DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list crawl records")?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Number of records currently stored.
    pub async fn size(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM crawl_records")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count crawl records")?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }

    /// Remove everything, buffer included.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM crawl_records")
            .execute(&self.pool)
            .await
            .context("Failed to clear crawl records")?;
        self.buffer.write().await.clear();
        Ok(())
    }

    async fn evict_oldest(&self) -> Result<()> {
        let row = sqlx::query(
            "SELECT url FROM crawl_records ORDER BY timestamp ASC, url_hash ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find eviction candidate")?;

        if let Some(row) = row {
            let url: String = row.get("url");
            debug!("Evicting oldest record: {url}");
            sqlx::query("DELETE FROM crawl_records WHERE url = ?")
                .bind(&url)
                .execute(&self.pool)
                .await
                .context("Failed to evict oldest record")?;
            self.buffer.write().await.pop(&url);
        }
        Ok(())
    }
}
