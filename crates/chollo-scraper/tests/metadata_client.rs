//! Integration tests for `MetadataClient::fetch`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Covers the happy path, partial payloads, and
//! every error variant that `fetch` can propagate.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chollo_scraper::{MetadataClient, ScrapeError};

/// Builds a `MetadataClient` suitable for tests: 5-second timeout.
fn test_client(base_url: &str) -> MetadataClient {
    MetadataClient::new(base_url, 5).expect("failed to build test MetadataClient")
}

/// Full metadata fixture in the scraping service's envelope shape.
fn full_payload() -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "title": "Notebook Lenovo IdeaPad 3",
            "description": "15.6 pulgadas, 8GB RAM",
            "publisher": "Mercado Libre",
            "image": { "url": "https://cdn.example/product.jpg" },
            "logo": { "url": "https://cdn.example/logo.png" }
        }
    })
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_maps_a_full_payload_into_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("url", "https://tienda.example/producto/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&full_payload()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let meta = client
        .fetch("https://tienda.example/producto/42")
        .await
        .expect("fetch should succeed");

    assert_eq!(meta.title.as_deref(), Some("Notebook Lenovo IdeaPad 3"));
    assert_eq!(meta.description.as_deref(), Some("15.6 pulgadas, 8GB RAM"));
    assert_eq!(meta.publisher.as_deref(), Some("Mercado Libre"));
    assert_eq!(
        meta.image_url.as_deref(),
        Some("https://cdn.example/product.jpg")
    );
    assert_eq!(meta.logo_url.as_deref(), Some("https://cdn.example/logo.png"));
}

// ---------------------------------------------------------------------------
// Partial and empty payloads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_tolerates_missing_and_blank_fields() {
    let server = MockServer::start().await;

    // Blank strings and absent assets should all collapse to None.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "data": {
                "title": "  ",
                "publisher": "Garbarino",
                "image": { "url": null }
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let meta = client
        .fetch("https://garbarino.example/tv")
        .await
        .expect("fetch should succeed");

    assert_eq!(meta.title, None);
    assert_eq!(meta.description, None);
    assert_eq!(meta.publisher.as_deref(), Some("Garbarino"));
    assert_eq!(meta.image_url, None);
    assert_eq!(meta.logo_url, None);
}

#[tokio::test]
async fn fetch_returns_empty_metadata_when_data_is_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"status": "fail"})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let meta = client
        .fetch("https://tienda.example/x")
        .await
        .expect("fetch should succeed");

    assert_eq!(meta, chollo_scraper::PageMetadata::default());
}

// ---------------------------------------------------------------------------
// Error propagation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_propagates_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.fetch("https://tienda.example/x").await;

    match result.expect_err("expected Err for 429 response") {
        ScrapeError::UnexpectedStatus { status, .. } => assert_eq!(status, 429),
        other => panic!("expected ScrapeError::UnexpectedStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_propagates_malformed_json_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.fetch("https://tienda.example/x").await;

    assert!(
        matches!(
            result.expect_err("expected Err for malformed JSON"),
            ScrapeError::Deserialize { .. }
        ),
        "expected ScrapeError::Deserialize"
    );
}
