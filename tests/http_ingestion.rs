mod common;

use common::{StubResponse, StubServer, unused_address};
use regard_healthcheck::config::ProbeSettings;
use regard_healthcheck::domain::ports::EventIngestion;
use regard_healthcheck::infrastructure::{HttpClientFactory, HttpIngestionClient};
use std::time::Duration;
use url::Url;

fn ingestion(base_url: &str) -> HttpIngestionClient {
    let settings = ProbeSettings {
        http_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        ..ProbeSettings::default()
    };
    let client = HttpClientFactory::create_client(&settings).unwrap();
    HttpIngestionClient::new(client, Url::parse(base_url).unwrap())
}

#[tokio::test]
async fn test_posts_json_with_content_type() {
    let server = StubServer::start(|_| StubResponse::new(202, "Accepted")).await;
    let client = ingestion(&server.base_url);

    let body = serde_json::json!({ "rowkey": "healthcheckX1X", "rowkeysignature": "abc" });
    let response = client
        .post_json("/track/v1/WithRegard/HealthCheck/event", &body)
        .await
        .unwrap();

    assert_eq!(response.status, 202);
    assert!(response.is_success());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path(), "/track/v1/WithRegard/HealthCheck/event");
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
    assert_eq!(requests[0].json(), body);
}

#[tokio::test]
async fn test_server_error_is_a_response_not_an_error() {
    let server = StubServer::start(|_| StubResponse::new(500, "Internal Server Error")).await;
    let client = ingestion(&server.base_url);

    let response = tokio_test::assert_ok!(
        client
            .post_json("/event", &serde_json::json!({ "rowkey": "x" }))
            .await
    );

    assert_eq!(response.status, 500);
    assert_eq!(response.reason, "Internal Server Error");
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_an_error() {
    let client = ingestion(&unused_address().await);

    let result = client.post_json("/event", &serde_json::json!({})).await;
    let err = tokio_test::assert_err!(result);
    assert!(format!("{:#}", err).contains("Failed to send event"));
}

#[tokio::test]
async fn test_rowkey_reaches_the_wire_unchanged() {
    let server = StubServer::start(|_| StubResponse::new(200, "OK")).await;
    let client = ingestion(&server.base_url);

    let rowkey = "healthcheckX638650000000000000X";
    client
        .post_json("/event", &serde_json::json!({ "rowkey": rowkey }))
        .await
        .unwrap();

    let body = server.requests()[0].json();
    assert_eq!(body["rowkey"].as_str(), Some(rowkey));
}
