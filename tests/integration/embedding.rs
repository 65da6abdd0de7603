//! Embedding and rerank proxy tests

use axum::http::{header, StatusCode};
use serde_json::{json, Value};

use crate::common::{constants::TEST_PROVIDER_KEY, user_auth, TestHarness};
use crate::mocks::MockProvider;

#[tokio::test]
async fn test_rerank_end_to_end() {
    let provider = MockProvider::start().await;
    let upstream = json!({
        "results": [
            {"index": 1, "relevance_score": 0.9},
            {"index": 0, "relevance_score": 0.3}
        ]
    });
    provider.mock_json("/rerank", upstream.clone()).await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/rerank")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "accessUrl": provider.base_url(),
            "accessKey": TEST_PROVIDER_KEY,
            "requestBody": {
                "model": "BAAI/bge-reranker-v2-m3",
                "query": "capital of France",
                "documents": ["Berlin is in Germany", "Paris is the capital of France"]
            }
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), upstream);
    assert_eq!(response.headers()["x-ratelimit-limit"], "1000");
}

#[tokio::test]
async fn test_embedding_forwards_request_body_unchanged() {
    let provider = MockProvider::start().await;
    provider
        .mock_json(
            "/embeddings",
            json!({"data": [{"index": 0, "embedding": [0.1, 0.2]}]}),
        )
        .await;
    let harness = TestHarness::new();

    let request_body = json!({
        "model": "BAAI/bge-m3",
        "input": ["hello", "world"],
        "encoding_format": "float",
        "dimensions": 1024
    });

    let response = harness
        .server
        .post("/api/proxy/embedding")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "accessUrl": provider.base_url(),
            "accessKey": TEST_PROVIDER_KEY,
            "requestBody": request_body
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(provider.received_json().await, vec![request_body]);
}

#[tokio::test]
async fn test_embedding_requires_input() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/embedding")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "accessUrl": provider.base_url(),
            "accessKey": TEST_PROVIDER_KEY,
            "requestBody": {"model": "BAAI/bge-m3", "input": ""}
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "input required");
}
