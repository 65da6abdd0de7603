//! Upstream failure normalization tests

use axum::http::{header, StatusCode};
use serde_json::{json, Value};

use crate::common::{constants::TEST_PROVIDER_KEY, user_auth, TestHarness};
use crate::mocks::MockProvider;

fn rerank_body(access_url: String) -> Value {
    json!({
        "accessUrl": access_url,
        "accessKey": TEST_PROVIDER_KEY,
        "requestBody": {"model": "m", "query": "q", "documents": ["d"]}
    })
}

#[tokio::test]
async fn test_upstream_json_error_keeps_status_and_body() {
    let provider = MockProvider::start().await;
    let upstream = json!({"error": {"message": "Invalid API key", "type": "auth"}});
    provider.mock_error("/rerank", 401, upstream.clone()).await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/rerank")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&rerank_body(provider.base_url()))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>(),
        json!({
            "error": "Upstream request failed",
            "message": "Invalid API key",
            "status": 401,
            "statusText": "Unauthorized",
            "data": upstream
        })
    );
}

#[tokio::test]
async fn test_upstream_text_error() {
    let provider = MockProvider::start().await;
    provider
        .mock_error_text("/rerank", 503, "service overloaded")
        .await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/rerank")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&rerank_body(provider.base_url()))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["message"], "service overloaded");
    assert_eq!(body["data"], "service overloaded");
    assert_eq!(body["statusText"], "Service Unavailable");
}

#[tokio::test]
async fn test_streaming_request_error_is_json_not_stream() {
    let provider = MockProvider::start().await;
    provider
        .mock_error("/chat/completions", 429, json!({"message": "quota exceeded"}))
        .await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/chat/completions")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "accessUrl": provider.base_url(),
            "accessKey": TEST_PROVIDER_KEY,
            "requestBody": {"model": "m", "messages": [], "stream": true}
        }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response
        .headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(response.json::<Value>()["message"], "quota exceeded");
}

#[tokio::test]
async fn test_unreachable_provider_is_generic_failure() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/rerank")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&rerank_body("http://127.0.0.1:9/v1".to_string()))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Proxy request failed");
    assert!(body.get("status").is_none());
}
