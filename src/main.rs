// Demo driver: crawl from a seed URL and print the best uningested context.
//
// Hosts embed `CrawlService` directly; this binary exists to exercise the
// full path (frontier -> workers -> store) against a real site.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use scopecrawl::{
    CrawlService, CrawlerConfigBuilder, NoAuth, PlainTextExtractor, TokenOverlapSimilarity,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().context("usage: scopecrawl <seed-url> [query]")?;
    let query = args.next();

    let config = CrawlerConfigBuilder::default()
        .storage_dir("./scopecrawl-data")
        .build()?;

    let service = CrawlService::new(
        config,
        Arc::new(NoAuth),
        Arc::new(PlainTextExtractor),
        Arc::new(TokenOverlapSimilarity),
    )
    .await?;

    match query {
        Some(query) => {
            info!("Starting active crawl for query: {query}");
            service.initiate_active_crawl(&query, vec![seed]).await;
        }
        None => {
            info!("Seeding crawl from {seed}");
            service.add_initial_url(&seed).await?;
        }
    }

    service.wait_until_idle().await;

    let records = service.get_uningested_context(10).await?;
    info!("Crawl finished: {} records stored", service.store().size().await?);
    for record in records {
        println!(
            "{:>8.3}  depth {}  {}",
            record.metric, record.depth, record.url
        );
    }

    Ok(())
}
