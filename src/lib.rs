pub mod collaborators;
pub mod collector;
pub mod config;
pub mod db;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod utils;
pub mod worker;

pub use collaborators::{
    AuthResolver, ContentExtractor, Extraction, NoAuth, NoSimilarity, PlainTextExtractor,
    ResolvedRequest, Similarity, TokenOverlapSimilarity,
};
pub use collector::{
    generate_tool_definitions, EndpointCollector, EndpointDescriptor, NetworkObservation,
    ObservationLog, Tool,
};
pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use scheduler::{CrawlScheduler, CrawlTask, Frontier, MetricWeights};
pub use service::CrawlService;
pub use store::{AddOutcome, ContentStore, CrawlRecord};
pub use worker::{FetchError, FetchOutcome, WorkerPool};
