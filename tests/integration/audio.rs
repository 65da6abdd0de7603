//! Speech recognition and synthesis proxy tests
//!
//! These capabilities are gated to one provider domain, so the harness points
//! the gate at the mock server host.

use axum::http::{header, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use modelhub_proxy::Config;
use serde_json::{json, Value};

use crate::common::{
    constants::{MOCK_HOST, TEST_PROVIDER_KEY},
    test_config, user_auth, TestHarness,
};
use crate::mocks::MockProvider;

#[tokio::test]
async fn test_transcription_is_sent_as_multipart_upload() {
    let provider = MockProvider::start().await;
    provider
        .mock_json("/audio/transcriptions", json!({"text": "hello world"}))
        .await;
    let harness = TestHarness::gated_to_mock();

    let audio = b"RIFF\x24\x00\x00\x00WAVEfmt fake-audio";
    let response = harness
        .server
        .post("/api/proxy/audio/transcriptions")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&json!({
            "modelInfo": {
                "accessUrl": provider.base_url(),
                "accessKey": TEST_PROVIDER_KEY,
                "modelName": "FunAudioLLM/SenseVoiceSmall"
            },
            "audioData": format!("data:audio/wav;base64,{}", STANDARD.encode(audio)),
            "language": "en"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"text": "hello world"}));

    let received = provider.received().await;
    assert_eq!(received.len(), 1);

    let content_type = received[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"model\""));
    assert!(body.contains("FunAudioLLM/SenseVoiceSmall"));
    assert!(body.contains("filename=\"audio.wav\""));
    assert!(body.contains("fake-audio"));
    assert!(body.contains("name=\"language\""));
}

fn transcription_body(access_url: String, audio: &[u8]) -> Value {
    json!({
        "modelInfo": {
            "accessUrl": access_url,
            "accessKey": TEST_PROVIDER_KEY,
            "modelName": "FunAudioLLM/SenseVoiceSmall"
        },
        "audioData": format!("data:audio/wav;base64,{}", STANDARD.encode(audio))
    })
}

#[tokio::test]
async fn test_transcription_accepts_uploads_over_two_megabytes() {
    let provider = MockProvider::start().await;
    provider
        .mock_json("/audio/transcriptions", json!({"text": "long recording"}))
        .await;
    let harness = TestHarness::gated_to_mock();

    // 2 MiB of audio is about 2.8 MB once base64 encoded.
    let audio = vec![0x52u8; 2 * 1024 * 1024];
    let response = harness
        .server
        .post("/api/proxy/audio/transcriptions")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&transcription_body(provider.base_url(), &audio))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"text": "long recording"}));

    let received = provider.received().await;
    assert_eq!(received.len(), 1);
    assert!(received[0].body.len() > audio.len());
}

#[tokio::test]
async fn test_oversized_upload_is_json_413() {
    let provider = MockProvider::start().await;
    provider.expect_no_calls().await;
    let harness = TestHarness::with_config(Config {
        gated_provider_domain: MOCK_HOST.to_string(),
        max_audio_upload_bytes: 1024,
        ..test_config()
    });

    let response = harness
        .server
        .post("/api/proxy/audio/transcriptions")
        .add_header(header::AUTHORIZATION, user_auth())
        .json(&transcription_body(provider.base_url(), &[0u8; 4096]))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response
        .headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: Value = response.json();
    assert_eq!(body["error"], "Payload too large");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_json_routes_keep_default_body_limit() {
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
            "requestBody": {"model": "bge", "input": "x".repeat(3 * 1024 * 1024)}
        }))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json::<Value>()["error"], "Payload too large");
}

#[tokio::test]
async fn test_speech_returns_audio_bytes() {
    let provider = MockProvider::start().await;
    let audio: &[u8] = b"ID3\x04\x00\x00mp3-frames";
    provider.mock_binary("/audio/speech", audio, "audio/mpeg").await;
    let harness = TestHarness::gated_to_mock();

    for route in ["/api/proxy/tts/speech", "/api/proxy/audio/speech"] {
        let response = harness
            .server
            .post(route)
            .add_header(header::AUTHORIZATION, user_auth())
            .json(&json!({
                "modelInfo": {
                    "accessUrl": provider.base_url(),
                    "accessKey": TEST_PROVIDER_KEY,
                    "modelName": "FunAudioLLM/CosyVoice2-0.5B"
                },
                "input": "Good morning",
                "voice": "FunAudioLLM/CosyVoice2-0.5B:alex",
                "responseFormat": "mp3"
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.headers()["content-type"], "audio/mpeg");
        assert_eq!(response.text().as_bytes(), audio);
    }

    let sent = provider.received_json().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["model"], "FunAudioLLM/CosyVoice2-0.5B");
    assert_eq!(sent[0]["input"], "Good morning");
    assert_eq!(sent[0]["response_format"], "mp3");
    assert!(sent[0].get("speed").is_none());
}
