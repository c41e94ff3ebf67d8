use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use infakt_core::{InfaktClient, InfaktError, Paginator, RetryPolicy};

fn client_for(server: &MockServer) -> InfaktClient {
    InfaktClient::with_base_url(&server.uri(), "test-key")
        .unwrap()
        .with_retry_policy(RetryPolicy::new(3, Duration::ZERO))
}

async fn mount_page(server: &MockServer, offset: &str, ids: &[u64], expected: u64) {
    let entities: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    Mock::given(method("GET"))
        .and(path("/api/v3/books.json"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", offset))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metainfo": { "count": ids.len(), "total_count": 3 },
            "entities": entities
        })))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn stops_at_first_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, "0", &[1, 2], 1).await;
    mount_page(&server, "2", &[3], 1).await;
    mount_page(&server, "4", &[], 1).await;
    mount_page(&server, "6", &[99], 0).await;

    let client = client_for(&server);
    let endpoint = client.resource_url("books").unwrap();
    let entities = Paginator::new(&client, endpoint, 2)
        .collect_all()
        .await
        .unwrap();

    let ids: Vec<_> = entities.iter().map(|e| e["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn exhausted_paginator_issues_no_more_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "0", &[], 1).await;

    let client = client_for(&server);
    let endpoint = client.resource_url("books").unwrap();
    let mut paginator = Paginator::new(&client, endpoint, 2);

    assert!(paginator.next_page().await.unwrap().is_none());
    assert!(paginator.next_page().await.unwrap().is_none());
    assert_eq!(paginator.pages_requested(), 1);
}

#[tokio::test]
async fn page_without_entities_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/books.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let endpoint = client.resource_url("books").unwrap();
    let err = Paginator::new(&client, endpoint, 2)
        .collect_all()
        .await
        .unwrap_err();
    assert!(matches!(err, InfaktError::InvalidPage { .. }));
}

#[tokio::test]
async fn malformed_metainfo_keeps_the_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/books.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "entities": [], "metainfo": "x" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let endpoint = client.resource_url("books").unwrap();
    let err = Paginator::new(&client, endpoint, 2)
        .collect_all()
        .await
        .unwrap_err();

    assert!(matches!(err, InfaktError::InvalidPage { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn failing_page_halts_the_sequence() {
    let server = MockServer::start().await;
    mount_page(&server, "0", &[1, 2], 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/books.json"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "4", &[], 0).await;

    let client = client_for(&server);
    let endpoint = client.resource_url("books").unwrap();
    let mut paginator = Paginator::new(&client, endpoint, 2);

    assert_eq!(paginator.next_page().await.unwrap().unwrap().len(), 2);
    assert!(paginator.next_page().await.unwrap_err().is_retry_exhaustion());
    assert!(paginator.next_page().await.unwrap().is_none());
}
