use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use scopecrawl::collaborators::{PlainTextExtractor, ResolvedRequest};
use scopecrawl::worker::{FetchError, WorkerPool};

fn pool() -> WorkerPool {
    WorkerPool::new(2, 4, Duration::from_secs(5), Arc::new(PlainTextExtractor))
        .expect("Should build worker pool")
}

fn request(url: String) -> ResolvedRequest {
    ResolvedRequest {
        url,
        headers: HashMap::new(),
    }
}

#[tokio::test]
async fn fetches_html_and_extracts_links() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/start")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(r#"<html><body><h1>Welcome</h1><a href="/next">next</a></body></html>"#)
        .create_async()
        .await;

    let outcome = pool()
        .submit(request(format!("{}/start", server.url())))
        .await
        .expect("Fetch should succeed");

    assert!(outcome.completed);
    assert!(outcome.content.contains("Welcome"));
    assert_eq!(outcome.links, vec![format!("{}/next", server.url())]);
}

#[tokio::test]
async fn follows_urls_found_in_json_payloads() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"{"name": "feed", "entries": [{"link": "https://a.test/item1"}, {"link": "https://a.test/item2"}]}"#;
    let _api = server
        .mock("GET", "/feed")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let outcome = pool()
        .submit(request(format!("{}/feed", server.url())))
        .await
        .expect("Fetch should succeed");

    assert!(outcome.completed);
    assert_eq!(
        outcome.links,
        vec!["https://a.test/item1", "https://a.test/item2"]
    );
}

#[tokio::test]
async fn reports_non_success_status() {
    let mut server = mockito::Server::new_async().await;
    let _err = server
        .mock("GET", "/gone")
        .with_status(503)
        .create_async()
        .await;

    let result = pool().submit(request(format!("{}/gone", server.url()))).await;
    match result {
        Err(FetchError::Status(503)) => {}
        other => panic!("Expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn reports_connection_failures_as_network_errors() {
    // Nothing listens on port 1.
    let result = pool()
        .submit(request("http://127.0.0.1:1/".to_string()))
        .await;
    assert!(matches!(result, Err(FetchError::Network(_))));
}

#[tokio::test]
async fn empty_extraction_is_not_completed() {
    let mut server = mockito::Server::new_async().await;
    let _blank = server
        .mock("GET", "/blank")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>   </body></html>")
        .create_async()
        .await;

    let outcome = pool()
        .submit(request(format!("{}/blank", server.url())))
        .await
        .expect("Fetch should succeed");
    assert!(!outcome.completed);
}

#[tokio::test]
async fn binary_content_yields_nothing() {
    let mut server = mockito::Server::new_async().await;
    let _img = server
        .mock("GET", "/logo.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![0x89, 0x50, 0x4e, 0x47])
        .create_async()
        .await;

    let outcome = pool()
        .submit(request(format!("{}/logo.png", server.url())))
        .await
        .expect("Fetch should succeed");
    assert!(!outcome.completed);
    assert!(outcome.content.is_empty());
    assert!(outcome.links.is_empty());
}

#[tokio::test]
async fn slow_responses_time_out() {
    let slow_pool = WorkerPool::new(
        1,
        1,
        Duration::from_millis(200),
        Arc::new(PlainTextExtractor),
    )
    .expect("Should build worker pool");

    let mut server = mockito::Server::new_async().await;
    let _slow = server
        .mock("GET", "/slow")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_secs(2));
            w.write_all(b"late")
        })
        .create_async()
        .await;

    let result = slow_pool
        .submit(request(format!("{}/slow", server.url())))
        .await;
    assert!(matches!(
        result,
        Err(FetchError::Timeout(_) | FetchError::Network(_))
    ));
}
