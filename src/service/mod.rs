//! Composition root and assistant-facing facade.
//!
//! `CrawlService` wires the scheduler, content store, worker pool, and
//! endpoint collector together. Everything is explicitly constructed and
//! dependency-injected; there are no ambient singletons, so tests build a
//! fresh service per case.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::debug;
use serde_json::Value;

use crate::collaborators::{AuthResolver, ContentExtractor, Similarity};
use crate::collector::{EndpointCollector, ObservationLog, Tool};
use crate::collector::tools::generate_tool_definitions;
use crate::config::CrawlerConfig;
use crate::scheduler::{CrawlScheduler, MetricWeights};
use crate::store::{AddOutcome, ContentStore, CrawlRecord};
use crate::utils::{normalize_url, INTERNAL_SCHEME};
use crate::worker::WorkerPool;

/// The exposed surface consumed by the assistant-facing layer.
pub struct CrawlService {
    store: Arc<ContentStore>,
    scheduler: Arc<CrawlScheduler>,
    observations: ObservationLog,
    collector: EndpointCollector,
    weights: MetricWeights,
    similarity: Arc<dyn Similarity>,
}

impl CrawlService {
    /// Build a service from configuration plus the three injected
    /// collaborators.
    pub async fn new(
        config: CrawlerConfig,
        auth: Arc<dyn AuthResolver>,
        extractor: Arc<dyn ContentExtractor>,
        similarity: Arc<dyn Similarity>,
    ) -> Result<Self> {
        let store = Arc::new(ContentStore::open(&config).await?);
        let workers = Arc::new(WorkerPool::new(
            config.worker_count(),
            config.backlog_limit(),
            config.fetch_timeout(),
            extractor,
        )?);
        let scheduler = Arc::new(
            CrawlScheduler::new(
                &config,
                Arc::clone(&store),
                workers,
                auth,
                Arc::clone(&similarity),
            )
            .await?,
        );
        let observations = ObservationLog::open(&config).await?;

        Ok(Self {
            store,
            scheduler,
            observations,
            collector: EndpointCollector::new(),
            weights: MetricWeights::from_config(&config),
            similarity,
        })
    }

    /// Seed a URL into the frontier; draining starts on acceptance.
    pub async fn add_initial_url(&self, url: &str) -> Result<bool> {
        self.scheduler.enqueue(url, 0, None, None).await
    }

    /// Store caller-supplied raw content directly, bypassing the fetch path.
    ///
    /// URLs that fail the scheme allowlist are keyed under the internal
    /// pseudo-scheme so the content still deduplicates stably.
    pub async fn add_initial_content(
        &self,
        url: &str,
        content: &str,
        depth: u32,
    ) -> Result<AddOutcome> {
        let keyed = match normalize_url(url) {
            Ok(normalized) => normalized,
            Err(_) => {
                let hash = format!(
                    "{:016x}",
                    xxhash_rust::xxh3::xxh3_64(url.as_bytes())
                );
                format!("{INTERNAL_SCHEME}://seed/{hash}")
            }
        };

        let similarity = match self.scheduler.active_query().await {
            Some(query) => self.similarity.score(&query, content).clamp(0.0, 1.0),
            None => 0.0,
        };
        let metric = self.weights.compute(similarity, depth, 1.0);

        self.store
            .add(&keyed, content, depth, None, similarity, metric)
            .await
    }

    /// Up to `limit` records not yet consumed downstream, best first.
    pub async fn get_uningested_context(&self, limit: usize) -> Result<Vec<CrawlRecord>> {
        self.store.get_uningested(limit).await
    }

    /// Mark a record consumed; its content is cleared but the record stays
    /// so the URL is never re-crawled.
    pub async fn mark_ingested(&self, url: &str) -> Result<bool> {
        self.store.mark_ingested(url).await
    }

    /// Active-query change: seed URLs preempt the backlog and draining
    /// resumes immediately.
    pub async fn initiate_active_crawl(&self, query: &str, seed_urls: Vec<String>) {
        self.scheduler.set_active_query(query, seed_urls).await;
    }

    /// Run a fresh collection pass over all accumulated observations.
    pub async fn get_tools(&self) -> Result<Vec<Tool>> {
        let observations = self.observations.all().await?;
        debug!("Collecting tools from {} observations", observations.len());
        Ok(self.collector.collect(&observations))
    }

    /// Tool definitions ready for the assistant's invocation layer.
    pub async fn get_tool_definitions(&self) -> Result<Vec<Value>> {
        Ok(generate_tool_definitions(&self.get_tools().await?))
    }

    /// Traffic-observer intake, phase one. Returns the request id.
    pub async fn observe_request(
        &self,
        url: &str,
        method: &str,
        headers: &HashMap<String, String>,
        body: Option<&str>,
    ) -> Result<String> {
        self.observations
            .observe_request(url, method, headers, body)
            .await
    }

    /// Traffic-observer intake, phase two.
    pub async fn observe_response(
        &self,
        request_id: &str,
        status: u16,
        headers: &HashMap<String, String>,
    ) -> Result<()> {
        self.observations
            .observe_response(request_id, status, headers)
            .await
    }

    /// Traffic-observer intake, phase three.
    pub async fn observe_body(&self, request_id: &str, body: &str) -> Result<()> {
        self.observations.observe_body(request_id, body).await
    }

    /// Block until the frontier is empty and no drain loop is running.
    ///
    /// Intended for the demo binary and tests; long-running hosts simply
    /// let the scheduler idle on its own.
    pub async fn wait_until_idle(&self) {
        loop {
            if !self.scheduler.is_draining() && self.scheduler.pending().await == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<CrawlScheduler> {
        &self.scheduler
    }
}
