//! Fixed-size fetch worker pool with a bounded internal backlog.
//!
//! Two semaphores bound the pool: one limits how many fetches run at once
//! (the worker count), the other caps how many submissions may be pending;
//! once the backlog is full, `submit` itself blocks the caller. This is the
//! same semaphore layering the crawl loop uses for page concurrency, minus
//! the per-domain tier the scheduler handles itself.

pub mod fetch;
pub mod json_links;

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::Semaphore;

use crate::collaborators::{ContentExtractor, ResolvedRequest};

pub use fetch::{ContentClass, FetchError, FetchOutcome};
pub use json_links::extract_json_links;

/// Pool of fetch-capable workers sharing one HTTP client.
pub struct WorkerPool {
    client: reqwest::Client,
    workers: Arc<Semaphore>,
    backlog: Arc<Semaphore>,
    worker_count: usize,
    fetch_timeout: Duration,
    extractor: Arc<dyn ContentExtractor>,
}

impl WorkerPool {
    /// Create a pool with `worker_count` parallel fetch slots and a backlog
    /// of `backlog_limit` pending submissions.
    pub fn new(
        worker_count: usize,
        backlog_limit: usize,
        fetch_timeout: Duration,
        extractor: Arc<dyn ContentExtractor>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        let worker_count = worker_count.max(1);
        Ok(Self {
            client,
            workers: Arc::new(Semaphore::new(worker_count)),
            backlog: Arc::new(Semaphore::new(worker_count + backlog_limit)),
            worker_count,
            fetch_timeout,
            extractor,
        })
    }

    /// Submit a fetch and await its outcome.
    ///
    /// Blocks while the backlog is full, then waits for a free worker. The
    /// fetch itself runs under an independent timeout; see
    /// [`fetch::fetch_once`].
    pub async fn submit(&self, request: ResolvedRequest) -> Result<FetchOutcome, FetchError> {
        let _backlog_slot = self
            .backlog
            .acquire()
            .await
            .map_err(|_| FetchError::Network("worker pool shut down".into()))?;

        let _worker_slot = self
            .workers
            .acquire()
            .await
            .map_err(|_| FetchError::Network("worker pool shut down".into()))?;

        debug!("Fetching {}", request.url);
        fetch::fetch_once(&self.client, &request, self.fetch_timeout, &*self.extractor).await
    }

    /// Number of fetches that may run in parallel.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}
