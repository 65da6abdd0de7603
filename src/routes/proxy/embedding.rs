//! Embedding and rerank proxies
//!
//! Both forward `requestBody` to the provider untouched once the fields the
//! provider needs are known to be there.

use std::sync::Arc;

use axum::{extract::State, response::Response, Extension};
use serde_json::{Map, Value};

use super::{dispatch, parse_body, prepare_target, DirectProxyRequest, RawBody};
use crate::{
    error::{AppResult, ErrorResponse},
    middleware::auth::AuthenticatedUser,
    proxy::{
        logging::RequestContext, validate::RequiredFields, Capability, ProxyMode, ProxyRequest,
    },
    AppState,
};

async fn forward_request_body(
    state: &AppState,
    user: &AuthenticatedUser,
    capability: Capability,
    body: RawBody,
    required_keys: &[&'static str],
) -> AppResult<Response> {
    let request: DirectProxyRequest = parse_body(body)?;

    let mut fields = RequiredFields::new();
    let access_url = fields.text("accessUrl", request.access_url);
    let access_key = fields.text("accessKey", request.access_key);
    let payload = match request.request_body {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    fields.keys_in(&payload, required_keys);
    fields.finish()?;

    let target = prepare_target(state, capability, &access_url, &access_key)?;

    let model = payload.get("model").and_then(Value::as_str).map(str::to_string);
    let ctx = RequestContext::new(capability)
        .with_model(model)
        .with_user(&user.id);

    dispatch(
        state,
        ProxyRequest::new(capability, target, ProxyMode::Json(Value::Object(payload))),
        ctx,
    )
    .await
}

/// Forward an embedding request
#[utoipa::path(
    post,
    path = "/api/proxy/embedding",
    tag = "Proxy",
    request_body = DirectProxyRequest,
    responses(
        (status = 200, description = "Provider embedding response"),
        (status = 400, description = "accessUrl, accessKey, model or input missing", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn embedding(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    forward_request_body(&state, &user, Capability::Embedding, body, &["model", "input"]).await
}

/// Forward a rerank request
#[utoipa::path(
    post,
    path = "/api/proxy/rerank",
    tag = "Proxy",
    request_body = DirectProxyRequest,
    responses(
        (status = 200, description = "Provider rerank response"),
        (status = 400, description = "accessUrl, accessKey, model, query or documents missing", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn rerank(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: RawBody,
) -> AppResult<Response> {
    forward_request_body(
        &state,
        &user,
        Capability::Rerank,
        body,
        &["model", "query", "documents"],
    )
    .await
}
