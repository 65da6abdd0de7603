//! Chat completion proxy and model connectivity test

use std::sync::Arc;

use axum::{extract::State, response::Response, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::{
    dispatch, parse_body, prepare_target, DirectProxyRequest, ModelCoordinates, ModelInfo, RawBody,
};
use crate::{
    error::{AppResult, ErrorResponse},
    middleware::auth::AuthenticatedUser,
    proxy::{
        logging::RequestContext, validate::RequiredFields, Capability, ProxyMode, ProxyRequest,
    },
    AppState,
};

const DEFAULT_TEST_PROMPT: &str = "Hello! Please reply with a short greeting.";
const MODEL_TEST_MAX_TOKENS: u32 = 64;

/// Forward a chat completion request
///
/// Streams the upstream event stream back unmodified when
/// `requestBody.stream` is true.
#[utoipa::path(
    post,
    path = "/api/proxy/chat/completions",
    tag = "Proxy",
    request_body = DirectProxyRequest,
    responses(
        (status = 200, description = "Provider response, JSON or text/event-stream"),
        (status = 400, description = "Missing fields or invalid provider URL", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Provider unreachable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    let request: DirectProxyRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let access_url = fields.text("accessUrl", request.access_url);
    let access_key = fields.text("accessKey", request.access_key);
    let payload = fields.object("requestBody", request.request_body);
    fields.finish()?;

    let target = prepare_target(&state, Capability::Chat, &access_url, &access_key)?;

    let streaming = payload.get("stream").and_then(Value::as_bool).unwrap_or(false);
    let model = payload.get("model").and_then(Value::as_str).map(str::to_string);
    let payload = Value::Object(payload);
    let mode = if streaming {
        ProxyMode::Stream(payload)
    } else {
        ProxyMode::Json(payload)
    };

    let ctx = RequestContext::new(Capability::Chat)
        .with_model(model)
        .with_streaming(mode.is_streaming())
        .with_user(&user.id);

    dispatch(&state, ProxyRequest::new(Capability::Chat, target, mode), ctx).await
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelTestRequest {
    pub model_info: Option<ModelInfo>,
    /// Message sent to the model; a short greeting when omitted
    pub prompt: Option<String>,
}

fn model_test_payload(model_name: &str, prompt: Option<&str>) -> Value {
    let prompt = prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_TEST_PROMPT);

    json!({
        "model": model_name,
        "messages": [{"role": "user", "content": prompt}],
        "stream": false,
        "max_tokens": MODEL_TEST_MAX_TOKENS,
    })
}

/// Send a single-message chat request to check a model endpoint works
///
/// Restricted to `admin` and `developer` roles.
#[utoipa::path(
    post,
    path = "/api/proxy/model/test",
    tag = "Proxy",
    request_body = ModelTestRequest,
    responses(
        (status = 200, description = "Provider chat completion response"),
        (status = 400, description = "Missing fields or invalid provider URL", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin or developer", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn model_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    let request: ModelTestRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let coords = ModelCoordinates::require(request.model_info, &mut fields);
    fields.finish()?;

    let target = prepare_target(&state, Capability::ModelTest, &coords.access_url, &coords.access_key)?
        .with_model(&coords.model_name);

    let payload = model_test_payload(&coords.model_name, request.prompt.as_deref());
    let ctx = RequestContext::new(Capability::ModelTest)
        .with_model(Some(&coords.model_name))
        .with_user(&user.id);

    dispatch(
        &state,
        ProxyRequest::new(Capability::ModelTest, target, ProxyMode::Json(payload)),
        ctx,
    )
    .await
}
