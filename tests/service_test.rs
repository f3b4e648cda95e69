use std::collections::HashMap;
use std::sync::Arc;

use scopecrawl::config::CrawlerConfig;
use scopecrawl::store::AddOutcome;
use scopecrawl::{CrawlService, NoAuth, PlainTextExtractor, TokenOverlapSimilarity};
use tempfile::TempDir;

async fn service_in(dir: &TempDir) -> CrawlService {
    let config = CrawlerConfig::builder()
        .storage_dir(dir.path())
        .worker_count(2)
        .fetch_timeout_ms(1000)
        .build()
        .expect("Should build config");

    CrawlService::new(
        config,
        Arc::new(NoAuth),
        Arc::new(PlainTextExtractor),
        Arc::new(TokenOverlapSimilarity),
    )
    .await
    .expect("Should build service")
}

fn prose(topic: &str) -> String {
    format!(
        "Reference notes about {topic}, long enough to pass the usefulness \
         bar and participate in ranking and retrieval downstream."
    )
}

#[tokio::test]
async fn seeds_with_disallowed_schemes_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    assert!(!service
        .add_initial_url("ftp://a.test/file")
        .await
        .expect("Should reject calmly"));
    assert!(!service
        .add_initial_url("javascript:void(0)")
        .await
        .expect("Should reject calmly"));
    assert_eq!(service.scheduler().pending().await, 0);
}

#[tokio::test]
async fn depth_beyond_the_bound_is_never_queued() {
    let dir = TempDir::new().expect("tempdir");
    let config = CrawlerConfig::builder()
        .storage_dir(dir.path())
        .max_depth(1)
        .fetch_timeout_ms(500)
        .build()
        .expect("Should build config");
    let service = CrawlService::new(
        config,
        Arc::new(NoAuth),
        Arc::new(PlainTextExtractor),
        Arc::new(TokenOverlapSimilarity),
    )
    .await
    .expect("Should build service");
    let scheduler = service.scheduler();

    // At the bound is fine; one past it is rejected. Links discovered on a
    // page at the bound go through this same guard at depth + 1.
    assert!(scheduler
        .enqueue("https://depth.invalid/at-bound", 1, None, None)
        .await
        .expect("Should accept depth at the bound"));
    assert!(!scheduler
        .enqueue("https://depth.invalid/too-deep", 2, None, None)
        .await
        .expect("Should reject depth past the bound"));

    // The rejected URL never entered the frontier, so once the accepted
    // task resolves (the host does not exist) nothing is left anywhere.
    service.wait_until_idle().await;
    assert_eq!(scheduler.pending().await, 0);
    assert_eq!(service.store().size().await.expect("size"), 0);
}

#[tokio::test]
async fn failed_fetches_release_their_in_flight_slots() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    service
        .add_initial_url("https://gone.invalid/a")
        .await
        .expect("Should seed");
    service.wait_until_idle().await;

    assert_eq!(service.scheduler().in_flight_len(), 0);
    assert_eq!(service.scheduler().pending().await, 0);
}

#[tokio::test]
async fn raw_content_is_stored_and_deduplicated() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    let first = service
        .add_initial_content("https://a.test/manual", &prose("manual"), 0)
        .await
        .expect("Should store raw content");
    assert_eq!(first, AddOutcome::Stored);

    let again = service
        .add_initial_content("https://a.test/manual", &prose("other text"), 0)
        .await
        .expect("Should detect duplicate");
    assert_eq!(again, AddOutcome::Duplicate);
}

#[tokio::test]
async fn raw_content_without_a_url_gets_an_internal_key() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    let first = service
        .add_initial_content("meeting notes", &prose("the meeting"), 0)
        .await
        .expect("Should store label-keyed content");
    assert_eq!(first, AddOutcome::Stored);

    // Same label resolves to the same internal key.
    let again = service
        .add_initial_content("meeting notes", &prose("the meeting"), 0)
        .await
        .expect("Should detect duplicate label");
    assert_eq!(again, AddOutcome::Duplicate);

    let records = service
        .get_uningested_context(10)
        .await
        .expect("Should pull context");
    assert_eq!(records.len(), 1);
    assert!(records[0].url.starts_with("internal://"));
}

#[tokio::test]
async fn ingestion_lifecycle_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    service
        .add_initial_content("https://a.test/doc", &prose("lifecycle"), 0)
        .await
        .expect("Should store");

    let pulled = service
        .get_uningested_context(5)
        .await
        .expect("Should pull");
    assert_eq!(pulled.len(), 1);

    assert!(service
        .mark_ingested(&pulled[0].url)
        .await
        .expect("Should mark ingested"));

    let after = service
        .get_uningested_context(5)
        .await
        .expect("Should pull again");
    assert!(after.is_empty());

    // The record still blocks re-adding the same URL.
    let readd = service
        .add_initial_content("https://a.test/doc", &prose("lifecycle"), 0)
        .await
        .expect("Should evaluate re-add");
    assert_eq!(readd, AddOutcome::Duplicate);
}

#[tokio::test]
async fn observed_traffic_becomes_tools() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    for (symbol, currency, body) in [
        ("IBM", "USD", r#"{"price": 172.5, "currency": "USD"}"#),
        ("AAPL", "EUR", r#"{"price": 189.1, "currency": "EUR"}"#),
    ] {
        let url = format!("https://api.test/stocks/{symbol}/price?currency={currency}");
        let id = service
            .observe_request(&url, "GET", &HashMap::new(), None)
            .await
            .expect("Should record request");
        service
            .observe_response(&id, 200, &HashMap::new())
            .await
            .expect("Should record response");
        service
            .observe_body(&id, body)
            .await
            .expect("Should record body");
    }

    let tools = service.get_tools().await.expect("Should collect tools");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].pattern, "/stocks/:param1/price");

    let definitions = service
        .get_tool_definitions()
        .await
        .expect("Should render definitions");
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0]["name"], "stocks");
}

#[tokio::test]
async fn observation_bodies_are_immutable_once_set() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    let id = service
        .observe_request("https://api.test/items/1", "GET", &HashMap::new(), None)
        .await
        .expect("Should record request");
    service
        .observe_body(&id, r#"{"id": 1}"#)
        .await
        .expect("Should attach body");
    service
        .observe_body(&id, r#"{"id": 999}"#)
        .await
        .expect("Second attach is a no-op");

    let tools = service.get_tools().await.expect("Should collect tools");
    assert_eq!(tools.len(), 1);
    let body = tools[0].endpoints[0].url.clone();
    assert_eq!(body, "https://api.test/items/1");
}

#[tokio::test]
async fn unreachable_hosts_are_purged_and_the_crawl_settles() {
    let dir = TempDir::new().expect("tempdir");
    let service = service_in(&dir).await;

    // .invalid never resolves, so both fetches fail; the first failure
    // purges the host's remaining queue entry.
    service
        .initiate_active_crawl(
            "anything",
            vec![
                "https://unreachable.invalid/a".to_string(),
                "https://unreachable.invalid/b".to_string(),
            ],
        )
        .await;

    service.wait_until_idle().await;

    assert_eq!(service.scheduler().pending().await, 0);
    assert_eq!(service.store().size().await.expect("size"), 0);
}
