//! Image and video generation proxies
//!
//! Video generation is two calls: submit returns a `requestId` and the caller
//! polls status with it. Nothing about the task is kept here between calls.

use std::sync::Arc;

use axum::{extract::State, response::Response, Extension};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::{dispatch, parse_body, prepare_target, ModelCoordinates, ModelInfo, RawBody};
use crate::{
    error::{AppError, AppResult, ErrorResponse},
    middleware::auth::AuthenticatedUser,
    proxy::{
        logging::RequestContext, validate::RequiredFields, Capability, ProxyMode, ProxyRequest,
    },
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationRequest {
    pub model_info: Option<ModelInfo>,
    pub prompt: Option<String>,
    /// e.g. `1024x1024`
    pub image_size: Option<String>,
    pub batch_size: Option<u32>,
    pub negative_prompt: Option<String>,
    pub num_inference_steps: Option<u32>,
    pub guidance_scale: Option<f64>,
    pub seed: Option<i64>,
    /// Reference image (URL or base64) for image-to-image models
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationPayload {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_inference_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoGenerationRequest {
    pub model_info: Option<ModelInfo>,
    pub prompt: Option<String>,
    pub image_size: Option<String>,
    pub negative_prompt: Option<String>,
    /// First frame for image-to-video models
    pub image: Option<String>,
    pub seed: Option<i64>,
}

#[derive(Debug, Serialize)]
struct VideoSubmitPayload {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusRequest {
    pub model_info: Option<ModelInfo>,
    /// ID returned by video generation
    pub request_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn encode<T: Serialize>(payload: &T) -> AppResult<Value> {
    serde_json::to_value(payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode provider request: {}", e)))
}

async fn forward_json(
    state: &AppState,
    user: &AuthenticatedUser,
    capability: Capability,
    coords: ModelCoordinates,
    payload: Value,
) -> AppResult<Response> {
    let target = prepare_target(state, capability, &coords.access_url, &coords.access_key)?
        .with_model(&coords.model_name);

    let ctx = RequestContext::new(capability)
        .with_model(Some(coords.model_name))
        .with_user(&user.id);

    dispatch(state, ProxyRequest::new(capability, target, ProxyMode::Json(payload)), ctx).await
}

/// Generate images from a prompt
#[utoipa::path(
    post,
    path = "/api/proxy/image/generation",
    tag = "Proxy",
    request_body = ImageGenerationRequest,
    responses(
        (status = 200, description = "Provider image generation response"),
        (status = 400, description = "Missing fields or invalid provider URL", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn image_generation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    let request: ImageGenerationRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let coords = ModelCoordinates::require(request.model_info, &mut fields);
    let prompt = fields.text("prompt", request.prompt);
    fields.finish()?;

    let payload = encode(&ImageGenerationPayload {
        model: coords.model_name.clone(),
        prompt,
        image_size: non_blank(request.image_size),
        batch_size: request.batch_size,
        negative_prompt: non_blank(request.negative_prompt),
        num_inference_steps: request.num_inference_steps,
        guidance_scale: request.guidance_scale,
        seed: request.seed,
        image: non_blank(request.image),
    })?;

    forward_json(&state, &user, Capability::ImageGeneration, coords, payload).await
}

/// Submit a video generation task
#[utoipa::path(
    post,
    path = "/api/proxy/video/generation",
    tag = "Proxy",
    request_body = VideoGenerationRequest,
    responses(
        (status = 200, description = "Provider submit response carrying `requestId`"),
        (status = 400, description = "Missing fields or unsupported provider", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn video_generation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    let request: VideoGenerationRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let coords = ModelCoordinates::require(request.model_info, &mut fields);
    let prompt = fields.text("prompt", request.prompt);
    fields.finish()?;

    let payload = encode(&VideoSubmitPayload {
        model: coords.model_name.clone(),
        prompt,
        image_size: non_blank(request.image_size),
        negative_prompt: non_blank(request.negative_prompt),
        image: non_blank(request.image),
        seed: request.seed,
    })?;

    forward_json(&state, &user, Capability::VideoSubmit, coords, payload).await
}

/// Fetch the state of a submitted video task
#[utoipa::path(
    post,
    path = "/api/proxy/video/status",
    tag = "Proxy",
    request_body = VideoStatusRequest,
    responses(
        (status = 200, description = "Provider task status, e.g. `InProgress`, `Succeed`, `Failed`"),
        (status = 400, description = "Missing fields or unsupported provider", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn video_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    let request: VideoStatusRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let coords = ModelCoordinates::require(request.model_info, &mut fields);
    let request_id = fields.text("requestId", request.request_id);
    fields.finish()?;

    let payload = json!({ "requestId": request_id.trim() });

    forward_json(&state, &user, Capability::VideoStatus, coords, payload).await
}
