//! Raw network traffic observations.
//!
//! Observations arrive in three phases from the traffic-capture
//! collaborator: request seen, response received, response body available.
//! Once a body is attached the row is immutable. The collector reads the
//! accumulated rows on demand; nothing here interprets them.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_64;

use crate::config::CrawlerConfig;
use crate::db;

/// SQL schema for the observation log
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS network_observations (
    request_id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    method TEXT NOT NULL,
    request_headers TEXT NOT NULL,
    request_body TEXT,
    response_status INTEGER,
    response_headers TEXT,
    response_body TEXT,
    content_hash TEXT,
    timestamp INTEGER NOT NULL
);
";

const DB_FILE: &str = "observations.sqlite";

/// One observed request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkObservation {
    pub request_id: String,
    pub url: String,
    pub method: String,
    pub request_headers: HashMap<String, String>,
    pub request_body: Option<String>,
    pub response_status: Option<u16>,
    pub response_headers: HashMap<String, String>,
    pub response_body: Option<String>,
    pub content_hash: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Append/update-in-place store of network observations, keyed by request id.
#[derive(Clone)]
pub struct ObservationLog {
    pool: SqlitePool,
}

fn headers_to_json(headers: &HashMap<String, String>) -> String {
    serde_json::to_string(headers).unwrap_or_else(|_| "{}".to_string())
}

fn headers_from_json(json: Option<String>) -> HashMap<String, String> {
    json.and_then(|j| serde_json::from_str(&j).ok())
        .unwrap_or_default()
}

impl ObservationLog {
    pub async fn open(config: &CrawlerConfig) -> Result<Self> {
        let pool = db::open_or_recover(config.storage_dir(), DB_FILE, SCHEMA_SQL).await?;
        Ok(Self { pool })
    }

    /// Phase one: a request was seen. Returns the generated request id.
    pub async fn observe_request(
        &self,
        url: &str,
        method: &str,
        headers: &HashMap<String, String>,
        body: Option<&str>,
    ) -> Result<String> {
        let request_id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO network_observations
             (request_id, url, method, request_headers, request_body, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&request_id)
        .bind(url)
        .bind(method)
        .bind(headers_to_json(headers))
        .bind(body)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to record request observation")?;

        Ok(request_id)
    }

    /// Phase two: the response status and headers arrived.
    pub async fn observe_response(
        &self,
        request_id: &str,
        status: u16,
        headers: &HashMap<String, String>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE network_observations
             SET response_status = ?, response_headers = ?
             WHERE request_id = ? AND response_body IS NULL",
        )
        .bind(i64::from(status))
        .bind(headers_to_json(headers))
        .bind(request_id)
        .execute(&self.pool)
        .await
        .context("Failed to record response observation")?;
        Ok(())
    }

    /// Phase three: the response body is available. The observation is
    /// immutable afterwards; a second call is a no-op.
    pub async fn observe_body(&self, request_id: &str, body: &str) -> Result<()> {
        let content_hash = format!("{:016x}", xxh3_64(body.as_bytes()));

        sqlx::query(
            "UPDATE network_observations
             SET response_body = ?, content_hash = ?
             WHERE request_id = ? AND response_body IS NULL",
        )
        .bind(body)
        .bind(content_hash)
        .bind(request_id)
        .execute(&self.pool)
        .await
        .context("Failed to attach response body")?;
        Ok(())
    }

    /// Every accumulated observation, oldest first.
    pub async fn all(&self) -> Result<Vec<NetworkObservation>> {
        let rows = sqlx::query("SELECT * FROM network_observations ORDER BY timestamp ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list observations")?;

        Ok(rows
            .iter()
            .map(|row| {
                let status: Option<i64> = row.get("response_status");
                let timestamp: i64 = row.get("timestamp");
                NetworkObservation {
                    request_id: row.get("request_id"),
                    url: row.get("url"),
                    method: row.get("method"),
                    request_headers: headers_from_json(row.get("request_headers")),
                    request_body: row.get("request_body"),
                    response_status: status.and_then(|s| u16::try_from(s).ok()),
                    response_headers: headers_from_json(row.get("response_headers")),
                    response_body: row.get("response_body"),
                    content_hash: row.get("content_hash"),
                    timestamp: DateTime::<Utc>::from_timestamp_millis(timestamp)
                        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                }
            })
            .collect())
    }

    /// Number of observations held.
    pub async fn len(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM network_observations")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count observations")?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }
}
