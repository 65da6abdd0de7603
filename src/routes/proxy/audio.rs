//! Speech recognition and synthesis proxies
//!
//! Both capabilities only work against the gated provider domain. Audio for
//! transcription arrives base64-encoded in JSON and is re-sent upstream as a
//! multipart file upload; synthesized audio is relayed back as raw bytes.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Response, Extension};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{dispatch, parse_body, prepare_target, ModelCoordinates, ModelInfo, RawBody};
use crate::{
    error::{AppError, AppResult, ErrorResponse},
    middleware::auth::AuthenticatedUser,
    proxy::{
        logging::RequestContext, validate::RequiredFields, AudioUpload, Capability, ProxyMode,
        ProxyRequest,
    },
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    pub model_info: Option<ModelInfo>,
    /// Base64 audio, optionally as a `data:` URL
    pub audio_data: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub language: Option<String>,
}

/// Decoded inline audio
#[derive(Debug, PartialEq)]
struct InlineAudio {
    bytes: Vec<u8>,
    /// Media type declared by a `data:` URL prefix
    mime_type: Option<String>,
}

fn decode_audio(encoded: &str) -> AppResult<InlineAudio> {
    let encoded = encoded.trim();
    let (mime_type, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest.split_once(',').ok_or_else(|| {
                AppError::BadRequest("audioData data URL has no payload".to_string())
            })?;
            let mime = meta
                .split(';')
                .next()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            (mime, payload)
        }
        None => (None, encoded),
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("audioData is not valid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest("audioData decodes to an empty file".to_string()));
    }

    Ok(InlineAudio { bytes, mime_type })
}

/// File name for the upload, derived from the media type when not given.
fn upload_file_name(file_name: Option<String>, mime_type: Option<&str>) -> String {
    if let Some(name) = file_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        return name;
    }

    let extension = match mime_type.and_then(|m| m.split('/').nth(1)) {
        Some("mpeg") | Some("mp3") => "mp3",
        Some("webm") => "webm",
        Some("ogg") => "ogg",
        Some("mp4") | Some("m4a") | Some("x-m4a") => "m4a",
        Some("flac") => "flac",
        _ => "wav",
    };
    format!("audio.{}", extension)
}

/// Transcribe audio with the provider's speech recognition model
#[utoipa::path(
    post,
    path = "/api/proxy/audio/transcriptions",
    tag = "Proxy",
    request_body = TranscriptionRequest,
    responses(
        (status = 200, description = "Provider transcription response"),
        (status = 400, description = "Missing fields, invalid audio or unsupported provider", body = ErrorResponse),
        (status = 413, description = "Request body exceeds the configured audio upload limit", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn transcriptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    let request: TranscriptionRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let coords = ModelCoordinates::require(request.model_info, &mut fields);
    let audio_data = fields.text("audioData", request.audio_data);
    fields.finish()?;

    let target = prepare_target(
        &state,
        Capability::Transcription,
        &coords.access_url,
        &coords.access_key,
    )?
    .with_model(&coords.model_name);

    let audio = decode_audio(&audio_data)?;
    let mime_type = request
        .mime_type
        .filter(|m| !m.trim().is_empty())
        .or(audio.mime_type);
    let file_name = upload_file_name(request.file_name, mime_type.as_deref());

    let mut extra_fields = Vec::new();
    if let Some(language) = request.language.filter(|l| !l.trim().is_empty()) {
        extra_fields.push(("language", language));
    }

    let upload = AudioUpload {
        bytes: Bytes::from(audio.bytes),
        file_name,
        mime_type,
        model: coords.model_name.clone(),
        fields: extra_fields,
    };

    let ctx = RequestContext::new(Capability::Transcription)
        .with_model(Some(&coords.model_name))
        .with_user(&user.id);

    dispatch(
        &state,
        ProxyRequest::new(Capability::Transcription, target, ProxyMode::MultipartUpload(upload)),
        ctx,
    )
    .await
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub model_info: Option<ModelInfo>,
    /// Text to synthesize
    pub input: Option<String>,
    pub voice: Option<String>,
    /// Audio container, e.g. `mp3`, `wav`, `opus`
    pub response_format: Option<String>,
    pub speed: Option<f64>,
    pub sample_rate: Option<u32>,
    pub gain: Option<f64>,
}

/// Body sent to the provider's `/audio/speech`
#[derive(Debug, Serialize)]
struct SpeechPayload {
    model: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gain: Option<f64>,
}

/// Synthesize speech; the audio bytes are returned as the provider sent them
#[utoipa::path(
    post,
    path = "/api/proxy/tts/speech",
    tag = "Proxy",
    request_body = SpeechRequest,
    responses(
        (status = 200, description = "Audio bytes with the provider's content type"),
        (status = 400, description = "Missing fields or unsupported provider", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn speech(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    let request: SpeechRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let coords = ModelCoordinates::require(request.model_info, &mut fields);
    let input = fields.text("input", request.input);
    fields.finish()?;

    let target = prepare_target(&state, Capability::Speech, &coords.access_url, &coords.access_key)?
        .with_model(&coords.model_name);

    let payload = SpeechPayload {
        model: coords.model_name.clone(),
        input,
        voice: request.voice.filter(|v| !v.trim().is_empty()),
        response_format: request.response_format.filter(|f| !f.trim().is_empty()),
        speed: request.speed,
        sample_rate: request.sample_rate,
        gain: request.gain,
    };
    let payload = serde_json::to_value(payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode speech request: {}", e)))?;

    let ctx = RequestContext::new(Capability::Speech)
        .with_model(Some(&coords.model_name))
        .with_user(&user.id);

    dispatch(
        &state,
        ProxyRequest::new(Capability::Speech, target, ProxyMode::Binary(payload)),
        ctx,
    )
    .await
}
