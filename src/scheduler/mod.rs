//! The crawl scheduler: frontier maintenance plus the drain loop.
//!
//! A single logical loop drives queue draining while actual fetches run in
//! parallel across the worker pool; completions are folded back in one at a
//! time, so every frontier and store mutation happens on the loop's task.
//! The loop is non-reentrant (an atomic guard flag); a successful `enqueue`
//! kicks a loop into existence when none is running.

pub mod frontier;
pub mod link_context;
pub mod metric;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashSet;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::collaborators::{AuthResolver, Similarity};
use crate::config::CrawlerConfig;
use crate::store::ContentStore;
use crate::worker::{FetchError, FetchOutcome, WorkerPool};

pub use frontier::{CrawlTask, Frontier};
pub use link_context::link_context;
pub use metric::MetricWeights;

use crate::utils::normalize_url;

/// Persistent, metric-ranked work queue dispatched across the worker pool,
/// with per-domain failure isolation.
pub struct CrawlScheduler {
    max_depth: u32,
    max_seed_urls: usize,
    seed_similarity: f64,
    worker_count: usize,
    weights: MetricWeights,
    store: Arc<ContentStore>,
    workers: Arc<WorkerPool>,
    frontier: Mutex<Frontier>,
    auth: Arc<dyn AuthResolver>,
    similarity: Arc<dyn Similarity>,
    active_query: RwLock<Option<String>>,
    /// Guard flag: true while a drain loop is running.
    draining: AtomicBool,
    /// URLs popped but not yet resolved, so a re-enqueue during the fetch
    /// window cannot double-dispatch.
    in_flight: DashSet<String>,
}

impl CrawlScheduler {
    pub async fn new(
        config: &CrawlerConfig,
        store: Arc<ContentStore>,
        workers: Arc<WorkerPool>,
        auth: Arc<dyn AuthResolver>,
        similarity: Arc<dyn Similarity>,
    ) -> Result<Self> {
        let frontier = Frontier::open(
            config.storage_dir(),
            config.frontier_capacity(),
            MetricWeights::from_config(config),
        )
        .await?;

        Ok(Self {
            max_depth: config.max_depth(),
            max_seed_urls: config.max_seed_urls(),
            seed_similarity: config.seed_similarity(),
            worker_count: config.worker_count(),
            weights: MetricWeights::from_config(config),
            store,
            workers,
            frontier: Mutex::new(frontier),
            auth,
            similarity,
            active_query: RwLock::new(None),
            draining: AtomicBool::new(false),
            in_flight: DashSet::new(),
        })
    }

    /// Add a URL to the frontier and start a drain loop if none is running.
    ///
    /// Returns `Ok(false)` for routine rejections: disallowed scheme, depth
    /// beyond the bound, or a URL the store already holds. A URL that is
    /// already queued still reports `Ok(true)`: its entry is replaced, so
    /// the frontier never holds two tasks for one normalized URL. The
    /// similarity score comes from `similarity_hint` when given
    /// (active-query seeds), otherwise from scoring the parent context
    /// snippet (or, lacking one, the URL itself) against the active query.
    pub async fn enqueue(
        self: &Arc<Self>,
        url: &str,
        depth: u32,
        similarity_hint: Option<f64>,
        parent_context: Option<String>,
    ) -> Result<bool> {
        let normalized = match normalize_url(url) {
            Ok(n) => n,
            Err(e) => {
                debug!("Rejecting enqueue: {e:#}");
                return Ok(false);
            }
        };

        if depth > self.max_depth {
            debug!("Rejecting {normalized}: depth {depth} exceeds bound {}", self.max_depth);
            return Ok(false);
        }

        if self.store.has(&normalized).await? {
            debug!("Rejecting {normalized}: already crawled");
            return Ok(false);
        }

        let similarity = match similarity_hint {
            Some(hint) => hint,
            None => match self.active_query.read().await.as_deref() {
                Some(query) => {
                    let text = parent_context.as_deref().unwrap_or(&normalized);
                    self.similarity.score(query, text).clamp(0.0, 1.0)
                }
                None => 0.0,
            },
        };

        // Age is zero at enqueue time, so the decay term starts at 1.
        let task_metric = self.weights.compute(similarity, depth, 1.0);
        let task =
            Frontier::make_task(normalized, depth, similarity, task_metric, parent_context)?;

        self.frontier.lock().await.insert(task).await?;
        self.kick();
        Ok(true)
    }

    /// Start a drain loop unless one is already running.
    pub fn kick(self: &Arc<Self>) {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let scheduler = Arc::clone(self);
            tokio::spawn(async move {
                scheduler.drain().await;
            });
        }
    }

    /// Change the active query: record it, enqueue the supplied seed URLs
    /// with a fixed very high similarity so they preempt the backlog, and
    /// resume draining.
    pub async fn set_active_query(self: &Arc<Self>, query: &str, seed_urls: Vec<String>) {
        info!("Active query changed: {query}");
        *self.active_query.write().await = Some(query.to_string());

        for url in seed_urls.into_iter().take(self.max_seed_urls) {
            match self.enqueue(&url, 0, Some(self.seed_similarity), None).await {
                Ok(true) => {}
                Ok(false) => debug!("Seed rejected: {url}"),
                Err(e) => warn!("Failed to enqueue seed {url}: {e:#}"),
            }
        }

        self.kick();
    }

    /// Currently configured active query, if any.
    pub async fn active_query(&self) -> Option<String> {
        self.active_query.read().await.clone()
    }

    /// Number of tasks waiting in the frontier.
    pub async fn pending(&self) -> usize {
        self.frontier.lock().await.len()
    }

    /// Whether a drain loop is currently running.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Number of URLs popped from the frontier but not yet resolved.
    #[must_use]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// The drain loop: fill the pool, fold one completion back in, repeat
    /// until the frontier is empty and nothing is in flight.
    ///
    /// Every failure in here is absorbed; one bad domain must never stall
    /// the frontier.
    async fn drain(self: Arc<Self>) {
        let mut active = FuturesUnordered::new();
        let mut last_host: Option<String> = None;

        loop {
            // Fill up to the worker count, preferring a host different from
            // the previous dispatch when metrics tie.
            while active.len() < self.worker_count {
                let popped = {
                    let mut frontier = self.frontier.lock().await;
                    match frontier.pop(last_host.as_deref()).await {
                        Ok(task) => task,
                        Err(e) => {
                            warn!("Frontier pop failed: {e:#}");
                            None
                        }
                    }
                };
                let Some(task) = popped else { break };

                match self.store.has(&task.url).await {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(e) => warn!("Store probe failed for {}: {e:#}", task.url),
                }

                if !self.in_flight.insert(task.url.clone()) {
                    continue;
                }

                last_host = Some(task.host.clone());
                let resolved = self.auth.resolve(&task.url);
                let workers = Arc::clone(&self.workers);
                // The URL rides outside the spawned task so a panicked
                // fetch still releases its in-flight slot.
                let url = task.url.clone();
                let handle = tokio::spawn(async move {
                    let outcome = workers.submit(resolved).await;
                    (task, outcome)
                });
                active.push(async move { (url, handle.await) });
            }

            let Some((url, joined)) = active.next().await else {
                // Nothing in flight and nothing poppable: the cycle is done.
                break;
            };
            self.in_flight.remove(&url);

            match joined {
                Ok((task, Ok(outcome))) => self.handle_fetched(&task, outcome).await,
                Ok((task, Err(e))) => self.handle_failure(&task, &e).await,
                Err(e) => error!("Fetch task panicked for {url}: {e}"),
            }
        }

        self.draining.store(false, Ordering::Release);

        // An enqueue may have landed between the last pop and the guard
        // reset; restart rather than strand it.
        if !self.frontier.lock().await.is_empty() {
            self.kick();
        }
    }

    async fn handle_fetched(self: &Arc<Self>, task: &CrawlTask, outcome: FetchOutcome) {
        if !outcome.completed {
            debug!("Empty extraction for {}, nothing to store", task.url);
            return;
        }

        match self
            .store
            .add(
                &task.url,
                &outcome.content,
                task.depth,
                outcome.last_modified,
                task.similarity,
                task.metric,
            )
            .await
        {
            Ok(result) => debug!("Stored {}: {result:?}", task.url),
            Err(e) => warn!("Failed to store {}: {e:#}", task.url),
        }

        let child_depth = task.depth + 1;
        if child_depth > self.max_depth {
            debug!(
                "Dropping {} discovered links at depth {child_depth} (bound {})",
                outcome.links.len(),
                self.max_depth
            );
            return;
        }

        for link in &outcome.links {
            let snippet = link_context(&outcome.content, link);
            match self.enqueue(link, child_depth, None, snippet).await {
                Ok(_) => {}
                Err(e) => warn!("Failed to enqueue discovered link {link}: {e:#}"),
            }
        }
    }

    /// Failure backoff: drop the failed task and purge every still-queued
    /// task on the same host for the remainder of this queue generation.
    async fn handle_failure(&self, task: &CrawlTask, error: &FetchError) {
        warn!("Fetch failed for {}: {error}", task.url);
        let mut frontier = self.frontier.lock().await;
        if let Err(e) = frontier.purge_host(&task.host).await {
            warn!("Failed to purge host {}: {e:#}", task.host);
        }
    }
}
