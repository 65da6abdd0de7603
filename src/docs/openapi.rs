//! OpenAPI specification for the proxy API
//!
//! Aggregates the proxy and health endpoints into a single OpenAPI document.

use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    error::ErrorResponse,
    routes::{
        health::{HealthResponse, HealthStatus},
        proxy::{
            audio::{SpeechRequest, TranscriptionRequest},
            chat::ModelTestRequest,
            media::{ImageGenerationRequest, VideoGenerationRequest, VideoStatusRequest},
            DirectProxyRequest, ModelInfo,
        },
    },
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ModelHub Proxy API",
        version = "1.0.0",
        description = "Authenticated pass-through to third-party model providers: chat, embeddings, rerank, speech, image and video generation"
    ),
    paths(
        crate::routes::proxy::chat::chat_completions,
        crate::routes::proxy::chat::model_test,
        crate::routes::proxy::embedding::embedding,
        crate::routes::proxy::embedding::rerank,
        crate::routes::proxy::audio::transcriptions,
        crate::routes::proxy::audio::speech,
        crate::routes::proxy::media::image_generation,
        crate::routes::proxy::media::video_generation,
        crate::routes::proxy::media::video_status,
        crate::routes::health::health_check,
    ),
    components(
        schemas(
            // Requests
            ModelInfo,
            DirectProxyRequest,
            ModelTestRequest,
            TranscriptionRequest,
            SpeechRequest,
            ImageGenerationRequest,
            VideoGenerationRequest,
            VideoStatusRequest,
            // Responses
            ErrorResponse,
            HealthStatus,
            HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Proxy", description = "Provider proxy endpoints"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ProxyApiDoc;

/// Security scheme addon for Bearer JWT authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
