//! Sqlite pool bootstrap shared by the frontier, content store, and
//! observation log.
//!
//! Uses WAL mode for concurrent reads during writes and a small connection
//! pool; worker-pool concurrency is bounded by a small constant, so nothing
//! heavier is needed. A database that fails to open or to accept its schema
//! is treated as corrupt: the files are removed and the store reinitialized
//! empty. Data loss there is acceptable; availability is not negotiable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;

async fn try_open(db_path: &Path, schema_sql: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .context("Failed to open sqlite database")?;

    // Idempotent schema setup (CREATE IF NOT EXISTS throughout)
    sqlx::query(schema_sql)
        .execute(&pool)
        .await
        .context("Failed to initialize database schema")?;

    Ok(pool)
}

fn remove_db_files(db_path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut path = PathBuf::from(db_path);
        if !suffix.is_empty() {
            let mut name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            name.push_str(suffix);
            path.set_file_name(name);
        }
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {e}", path.display());
            }
        }
    }
}

/// Open the database at `{storage_dir}/{file_name}`, applying `schema_sql`.
///
/// On open or schema failure the database files are deleted and opening is
/// retried once against an empty database.
pub async fn open_or_recover(
    storage_dir: &Path,
    file_name: &str,
    schema_sql: &str,
) -> Result<SqlitePool> {
    tokio::fs::create_dir_all(storage_dir)
        .await
        .context("Failed to create storage directory")?;

    let db_path = storage_dir.join(file_name);

    match try_open(&db_path, schema_sql).await {
        Ok(pool) => Ok(pool),
        Err(e) => {
            warn!(
                "Discarding corrupt database {}: {e:#}",
                db_path.display()
            );
            remove_db_files(&db_path);
            try_open(&db_path, schema_sql)
                .await
                .context("Failed to reinitialize database after discarding corrupt file")
        }
    }
}
