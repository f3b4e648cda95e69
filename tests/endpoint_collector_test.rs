use std::collections::HashMap;

use chrono::Utc;
use scopecrawl::{EndpointCollector, NetworkObservation};

fn observation(url: &str, response_body: &str) -> NetworkObservation {
    NetworkObservation {
        request_id: uuid::Uuid::new_v4().to_string(),
        url: url.to_string(),
        method: "GET".to_string(),
        request_headers: HashMap::new(),
        request_body: None,
        response_status: Some(200),
        response_headers: HashMap::new(),
        response_body: Some(response_body.to_string()),
        content_hash: None,
        timestamp: Utc::now(),
    }
}

const IBM_BODY: &str = r#"{"price": 172.5, "currency": "USD"}"#;
const AAPL_BODY: &str = r#"{"price": 189.1, "currency": "EUR"}"#;

#[test]
fn clusters_same_shape_endpoints_into_one_tool() {
    let observations = vec![
        observation("https://api.test/stocks/IBM/price?currency=USD", IBM_BODY),
        observation("https://api.test/stocks/AAPL/price?currency=EUR", AAPL_BODY),
    ];

    let tools = EndpointCollector::new().collect(&observations);
    assert_eq!(tools.len(), 1);

    let tool = &tools[0];
    assert_eq!(tool.name, "stocks");
    assert_eq!(tool.pattern, "/stocks/:param1/price");
    assert_eq!(tool.endpoints.len(), 2);

    let currencies = tool
        .query_param_options
        .get("currency")
        .expect("currency options");
    assert!(currencies.contains("USD") && currencies.contains("EUR"));
}

#[test]
fn different_response_shapes_split_tools() {
    let observations = vec![
        observation("https://api.test/stocks/IBM/price", IBM_BODY),
        observation(
            "https://api.test/stocks/IBM/history",
            r#"{"series": [{"date": "2024-01-02", "close": 170.0}]}"#,
        ),
    ];

    let tools = EndpointCollector::new().collect(&observations);
    assert_eq!(tools.len(), 2);
    // Both tools come from the /stocks family, so the second gets a suffix.
    assert_eq!(tools[0].name, "stocks");
    assert_eq!(tools[1].name, "stocks_2");
}

#[test]
fn duplicate_urls_within_a_run_are_ignored() {
    let observations = vec![
        observation("https://api.test/stocks/IBM/price", IBM_BODY),
        observation("https://api.test/stocks/IBM/price", IBM_BODY),
    ];

    let tools = EndpointCollector::new().collect(&observations);
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].endpoints.len(), 1);
}

#[test]
fn grouping_is_independent_of_arrival_order() {
    let a = observation("https://api.test/stocks/IBM/price?currency=USD", IBM_BODY);
    let b = observation("https://api.test/stocks/AAPL/price?currency=EUR", AAPL_BODY);

    let collector = EndpointCollector::new();
    let forward = collector.collect(&[a.clone(), b.clone()]);
    let reverse = collector.collect(&[b, a]);

    assert_eq!(forward.len(), reverse.len());
    assert_eq!(forward[0].pattern, reverse[0].pattern);
    assert_eq!(forward[0].schema_signature, reverse[0].schema_signature);
    assert_eq!(
        forward[0].query_param_options,
        reverse[0].query_param_options
    );
}

#[test]
fn observations_without_bodies_still_generalize() {
    let mut obs = observation("https://api.test/users/42/profile", "");
    obs.response_body = None;

    let endpoint = EndpointCollector::new()
        .process_endpoint(&obs)
        .expect("Should process body-less observation");
    assert_eq!(endpoint.template, "/users/:param1/:param2");
}

#[tokio::test]
async fn observation_log_persists_across_reopen() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let config = scopecrawl::CrawlerConfig::builder()
        .storage_dir(dir.path())
        .build()
        .expect("Should build config");

    let id = {
        let log = scopecrawl::ObservationLog::open(&config)
            .await
            .expect("Should open log");
        let id = log
            .observe_request("https://api.test/stocks/IBM/price", "GET", &HashMap::new(), None)
            .await
            .expect("Should record request");
        log.observe_body(&id, IBM_BODY).await.expect("Should attach body");
        id
    };

    let reopened = scopecrawl::ObservationLog::open(&config)
        .await
        .expect("Should reopen log");
    assert_eq!(reopened.len().await.expect("count"), 1);

    let rows = reopened.all().await.expect("Should list observations");
    assert_eq!(rows[0].request_id, id);
    assert_eq!(rows[0].response_body.as_deref(), Some(IBM_BODY));
    assert!(rows[0].content_hash.is_some());
}

#[test]
fn tool_definitions_expose_placeholders_and_enums() {
    let observations = vec![
        observation("https://api.test/stocks/IBM/price?currency=USD", IBM_BODY),
        observation("https://api.test/stocks/AAPL/price?currency=EUR", AAPL_BODY),
    ];

    let tools = EndpointCollector::new().collect(&observations);
    let definitions = scopecrawl::generate_tool_definitions(&tools);
    assert_eq!(definitions.len(), 1);

    let def = &definitions[0];
    assert_eq!(def["name"], "stocks");
    assert_eq!(def["pattern"], "/stocks/:param1/price");

    let required = def["parameters"]["required"]
        .as_array()
        .expect("required array");
    assert!(required.iter().any(|v| v == "param1"));

    let examples = def["parameters"]["properties"]["param1"]["examples"]
        .as_array()
        .expect("placeholder examples");
    assert!(examples.iter().any(|v| v == "IBM"));
    assert!(examples.iter().any(|v| v == "AAPL"));

    // Two observed values is well under the enum cutoff.
    let currency_enum = def["parameters"]["properties"]["currency"]["enum"]
        .as_array()
        .expect("currency enum");
    assert_eq!(currency_enum.len(), 2);
}
