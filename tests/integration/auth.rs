//! Authentication, role gate and rate limiting tests

use axum::http::{header, StatusCode};
use modelhub_proxy::Config;
use serde_json::{json, Value};

use crate::common::{bearer, test_config, user_auth, TestHarness};
use crate::mocks::MockProvider;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/rerank")
        .json(&json!({"accessUrl": provider.base_url(), "accessKey": "k"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Unauthorized");
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/embedding")
        .add_header(
            header::AUTHORIZATION,
            "Bearer eyJhbGciOiJIUzI1NiJ9.eyJpZCI6MX0.c2lnbmF0dXJl".parse().unwrap(),
        )
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid token");
}

#[tokio::test]
async fn test_model_test_requires_developer_role() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::new();

    let body = json!({
        "modelInfo": {
            "accessUrl": provider.base_url(),
            "accessKey": "sk-provider-test",
            "modelName": "Qwen/Qwen2.5-7B-Instruct"
        }
    });

    let response = harness
        .server
        .post("/api/proxy/model/test")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&body)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"], "Forbidden");
}

#[tokio::test]
async fn test_admin_may_test_models() {
    let provider = MockProvider::start().await;
    provider
        .mock_json("/chat/completions", json!({"choices": [{"message": {"content": "hi"}}]}))
        .await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/model/test")
        .add_header(header::AUTHORIZATION, bearer("admin"))
        .json(&json!({
            "modelInfo": {
                "accessUrl": provider.base_url(),
                "accessKey": "sk-provider-test",
                "modelName": "Qwen/Qwen2.5-7B-Instruct"
            },
            "prompt": "ping"
        }))
        .await;

    response.assert_status_ok();

    let sent = provider.received_json().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["model"], "Qwen/Qwen2.5-7B-Instruct");
    assert_eq!(sent[0]["messages"], json!([{"role": "user", "content": "ping"}]));
    assert_eq!(sent[0]["stream"], false);
}

#[tokio::test]
async fn test_rate_limit_per_user() {
    let harness = TestHarness::with_config(Config {
        rate_limit_per_minute: 2,
        ..test_config()
    });

    for _ in 0..2 {
        harness
            .server
            .post("/api/proxy/embedding")
            .add_header(header::AUTHORIZATION, user_auth())
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let response = harness
        .server
        .post("/api/proxy/embedding")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get(header::RETRY_AFTER).is_some());
    assert_eq!(response.headers()["x-ratelimit-limit"], "2");
    assert_eq!(response.json::<Value>()["error"], "Too many requests");
}
