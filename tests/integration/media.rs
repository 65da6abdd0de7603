//! Image and video generation proxy tests

use axum::http::header;
use serde_json::{json, Value};

use crate::common::{constants::TEST_PROVIDER_KEY, user_auth, TestHarness};
use crate::mocks::MockProvider;

fn model_info(provider: &MockProvider, model: &str) -> Value {
    json!({
        "accessUrl": provider.base_url(),
        "accessKey": TEST_PROVIDER_KEY,
        "modelName": model
    })
}

#[tokio::test]
async fn test_image_generation_maps_fields() {
    let provider = MockProvider::start().await;
    let upstream = json!({"images": [{"url": "https://cdn.example.com/fox.png"}], "seed": 7});
    provider.mock_json("/images/generations", upstream.clone()).await;
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/proxy/image/generation")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": model_info(&provider, "black-forest-labs/FLUX.1-schnell"),
            "prompt": "a red fox in the snow",
            "imageSize": "1024x1024",
            "batchSize": 1,
            "numInferenceSteps": 20
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), upstream);

    let sent = provider.received_json().await;
    assert_eq!(
        sent[0],
        json!({
            "model": "black-forest-labs/FLUX.1-schnell",
            "prompt": "a red fox in the snow",
            "image_size": "1024x1024",
            "batch_size": 1,
            "num_inference_steps": 20
        })
    );
}

#[tokio::test]
async fn test_video_submit_then_status() {
    let provider = MockProvider::start().await;
    provider
        .mock_json("/video/submit", json!({"requestId": "req-123"}))
        .await;
    provider
        .mock_json(
            "/video/status",
            json!({"status": "Succeed", "results": {"videos": [{"url": "https://cdn.example.com/v.mp4"}]}}),
        )
        .await;
    let harness = TestHarness::gated_to_mock();

    let submit = harness
        .server
        .post("/api/proxy/video/generation")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": model_info(&provider, "Wan-AI/Wan2.1-T2V-14B"),
            "prompt": "waves at sunset",
            "imageSize": "1280x720"
        }))
        .await;

    submit.assert_status_ok();
    let request_id = submit.json::<Value>()["requestId"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(request_id, "req-123");

    let status = harness
        .server
        .post("/api/proxy/video/status")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": model_info(&provider, "Wan-AI/Wan2.1-T2V-14B"),
            "requestId": request_id
        }))
        .await;

    status.assert_status_ok();
    assert_eq!(status.json::<Value>()["status"], "Succeed");

    let sent = provider.received_json().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["image_size"], "1280x720");
    assert_eq!(sent[1], json!({"requestId": "req-123"}));
}
