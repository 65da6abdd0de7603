//! Request validation: nothing reaches the provider until every check passes

use axum::http::{header, StatusCode};
use serde_json::{json, Value};

use crate::common::{bearer, user_auth, TestHarness};
use crate::mocks::MockProvider;

#[tokio::test]
async fn test_missing_access_key_is_rejected_before_upstream() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/chat/completions")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "accessUrl": provider.base_url(),
            "requestBody": {"model": "m", "messages": []}
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["message"], "accessKey required");
}

#[tokio::test]
async fn test_every_missing_field_is_named() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/rerank")
        .add_header(header::AUTHORIZATION, user_auth())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "accessUrl, accessKey, model, query, documents required"
    );
}

#[tokio::test]
async fn test_every_route_requires_access_key() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::gated_to_mock();

    let model_info = json!({"accessUrl": provider.base_url(), "modelName": "m"});
    let direct = |request_body: Value| {
        json!({"accessUrl": provider.base_url(), "requestBody": request_body})
    };
    let nested = |extra: Value| {
        let mut body = extra;
        body["modelInfo"] = model_info.clone();
        body
    };

    let cases = [
        (
            "/api/proxy/chat/completions",
            direct(json!({"model": "m", "messages": []})),
        ),
        ("/api/proxy/model/test", nested(json!({}))),
        (
            "/api/proxy/embedding",
            direct(json!({"model": "m", "input": "hi"})),
        ),
        (
            "/api/proxy/rerank",
            direct(json!({"model": "m", "query": "q", "documents": ["d"]})),
        ),
        (
            "/api/proxy/audio/transcriptions",
            nested(json!({"audioData": "UklGRg=="})),
        ),
        ("/api/proxy/tts/speech", nested(json!({"input": "hello"}))),
        ("/api/proxy/audio/speech", nested(json!({"input": "hello"}))),
        ("/api/proxy/image/generation", nested(json!({"prompt": "a cat"}))),
        ("/api/proxy/video/generation", nested(json!({"prompt": "a cat"}))),
        ("/api/proxy/video/status", nested(json!({"requestId": "req-1"}))),
    ];

    for (route, body) in cases {
        let response = harness
            .server
            .post(route)
            .add_header(header::AUTHORIZATION, bearer("developer"))
            .json(&body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let json: Value = response.json();
        assert_eq!(json["error"], "Missing required fields", "route {route}");
        assert_eq!(json["message"], "accessKey required", "route {route}");
    }

    assert!(provider.received().await.is_empty());
}

#[tokio::test]
async fn test_blank_model_info_fields_count_as_missing() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/image/generation")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": {"accessUrl": provider.base_url(), "accessKey": "  "},
            "prompt": ""
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "accessKey, modelName, prompt required"
    );
}

#[tokio::test]
async fn test_invalid_access_url() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/embedding")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "accessUrl": "ftp://files.example.com",
            "accessKey": "sk-provider-test",
            "requestBody": {"model": "bge-m3", "input": "hello"}
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Bad request");
    assert!(body["message"].as_str().unwrap().starts_with("Invalid accessUrl"));
}

#[tokio::test]
async fn test_gated_capability_rejects_other_providers() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/audio/transcriptions")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": {
                "accessUrl": provider.base_url(),
                "accessKey": "sk-provider-test",
                "modelName": "FunAudioLLM/SenseVoiceSmall"
            },
            "audioData": "UklGRmZha2U="
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unsupported provider");
    assert_eq!(
        body["message"],
        "audio transcription only supports siliconflow.cn endpoints"
    );
}

#[tokio::test]
async fn test_lookalike_domain_is_not_gated_provider() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/video/status")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": {
                "accessUrl": "https://siliconflow.cn.attacker.example/v1",
                "accessKey": "sk-provider-test",
                "modelName": "Wan-AI/Wan2.1-T2V-14B"
            },
            "requestId": "req-1"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Unsupported provider");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/chat/completions")
        .add_header(header::AUTHORIZATION, user_auth())
        .text("{\"accessUrl\": ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_invalid_audio_data() {
    let harness = TestHarness::gated_to_mock();
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;

    let response = harness
        .server
        .post("/api/proxy/audio/transcriptions")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": {
                "accessUrl": provider.base_url(),
                "accessKey": "sk-provider-test",
                "modelName": "FunAudioLLM/SenseVoiceSmall"
            },
            "audioData": "%%% not base64 %%%"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .starts_with("audioData is not valid base64"));
}
