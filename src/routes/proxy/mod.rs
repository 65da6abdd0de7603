//! Provider proxy routes
//!
//! Every route follows the same steps: parse the body, check that all
//! required fields are present, clean and validate the provider target,
//! apply the provider gate, then hand a [`ProxyRequest`] to the upstream and
//! relay what comes back. Nothing leaves the service before the checks pass.

pub mod audio;
pub mod chat;
pub mod embedding;
pub mod media;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit},
    middleware,
    response::Response,
    routing::post,
    Router,
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::Instrument;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::require_developer,
    proxy::{
        logging::RequestContext,
        relay::{relay_binary, relay_json, relay_stream},
        validate::{ensure_provider_domain, RequiredFields},
        Capability, ProviderTarget, ProxyRequest, RelayKind, UpstreamError,
    },
    routes::metrics::{record_request, record_upstream_status},
    AppState, Config,
};

/// Request body as buffered by axum. A rejection (size limit, aborted
/// upload) is turned into an error envelope when the body is parsed.
pub(crate) type RawBody = Result<Bytes, BytesRejection>;

/// Create the proxy router, mounted under `/api/proxy`
///
/// Base64 audio is far larger than any JSON payload, so the transcription
/// route carries its own body limit. The rest keep axum's 2 MB default.
pub fn create_proxy_router(config: &Config) -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/completions", post(chat::chat_completions))
        .route(
            "/model/test",
            post(chat::model_test).route_layer(middleware::from_fn(require_developer)),
        )
        .route("/embedding", post(embedding::embedding))
        .route("/rerank", post(embedding::rerank))
        .route(
            "/audio/transcriptions",
            post(audio::transcriptions)
                .layer(DefaultBodyLimit::max(config.max_audio_upload_bytes)),
        )
        .route("/tts/speech", post(audio::speech))
        .route("/audio/speech", post(audio::speech))
        .route("/image/generation", post(media::image_generation))
        .route("/video/generation", post(media::video_generation))
        .route("/video/status", post(media::video_status))
}

/// Provider coordinates nested under `modelInfo`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Provider base URL, e.g. `https://api.siliconflow.cn/v1`
    pub access_url: Option<String>,
    /// Provider API key, sent upstream as a bearer token
    pub access_key: Option<String>,
    pub model_name: Option<String>,
}

/// Required `modelInfo` values once presence has been checked
#[derive(Debug)]
pub(crate) struct ModelCoordinates {
    pub access_url: String,
    pub access_key: String,
    pub model_name: String,
}

impl ModelCoordinates {
    pub(crate) fn require(info: Option<ModelInfo>, fields: &mut RequiredFields) -> Self {
        let info = info.unwrap_or_default();
        Self {
            access_url: fields.text("accessUrl", info.access_url),
            access_key: fields.text("accessKey", info.access_key),
            model_name: fields.text("modelName", info.model_name),
        }
    }
}

/// `{accessUrl, accessKey, requestBody}` body shared by chat, embedding and rerank
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectProxyRequest {
    pub access_url: Option<String>,
    pub access_key: Option<String>,
    /// Forwarded to the provider unchanged
    #[schema(value_type = Object)]
    pub request_body: Option<Value>,
}

/// Parse a JSON body. Absent fields become `None` so they can be reported
/// together rather than failing deserialization.
pub(crate) fn parse_body<T: DeserializeOwned>(body: RawBody) -> AppResult<T> {
    let body = body?;
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body
    };
    serde_json::from_slice(raw).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Clean and validate the target, then apply the provider gate.
pub(crate) fn prepare_target(
    state: &AppState,
    capability: Capability,
    access_url: &str,
    access_key: &str,
) -> AppResult<ProviderTarget> {
    let target = ProviderTarget::new(access_url, access_key)?;
    if capability.is_provider_gated() {
        ensure_provider_domain(&target.url, &state.config.gated_provider_domain, capability)?;
    }
    Ok(target)
}

/// Send a validated request upstream and relay the response.
pub(crate) async fn dispatch(
    state: &AppState,
    request: ProxyRequest,
    ctx: RequestContext,
) -> AppResult<Response> {
    let started = Instant::now();
    let capability = request.capability;
    let relay = request.mode.relay();

    ctx.log_request_start();
    ctx.log_upstream_request(&request.url());

    let result = match state.upstream.send(request).instrument(ctx.create_span()).await {
        Ok(response) => {
            let status = response.status.as_u16();
            ctx.log_upstream_response(status);
            record_upstream_status(capability, status);
            match relay {
                RelayKind::Json => relay_json(response).await,
                RelayKind::Binary => relay_binary(response).await,
                RelayKind::Stream => relay_stream(response, ctx.clone()).await,
            }
        }
        Err(err) => {
            if let UpstreamError::Status { status, .. } = &err {
                ctx.log_upstream_response(status.as_u16());
                record_upstream_status(capability, status.as_u16());
            }
            Err(AppError::from(err))
        }
    };

    match &result {
        Ok(_) => record_request(capability, "success", started.elapsed()),
        Err(e) => {
            ctx.log_error(&e.to_string());
            let outcome = match e {
                AppError::Upstream(_) => "upstream_error",
                _ => "transport_error",
            };
            record_request(capability, outcome, started.elapsed());
        }
    }

    result
}
