//! Documentation endpoints
//!
//! Serves Swagger UI and the raw OpenAPI spec. When `DOCS_API_KEY` is set the
//! `X-Docs-Key` header must match it; otherwise the routes answer 404 so
//! their existence is not revealed.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

use crate::docs::ProxyApiDoc;

/// Expected docs key; `None` leaves the docs open (local development)
#[derive(Clone)]
struct DocsKey(Option<Arc<str>>);

async fn docs_auth_middleware(
    State(DocsKey(expected)): State<DocsKey>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get("X-Docs-Key")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(provided) if provided == &*expected => next.run(request).await,
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ProxyApiDoc::openapi())
}

async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

/// Create the docs router
///
/// Routes:
/// - GET /api/docs - Swagger UI
/// - GET /api/docs/ - Swagger UI (with trailing slash)
/// - GET /api/docs/openapi.json - Raw OpenAPI spec
pub fn create_docs_router<S>(docs_api_key: Option<String>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let key = DocsKey(docs_api_key.filter(|k| !k.is_empty()).map(Arc::from));

    Router::new()
        .route("/api/docs", get(swagger_ui))
        .route("/api/docs/", get(swagger_ui))
        .route("/api/docs/openapi.json", get(openapi_json))
        .layer(axum::middleware::from_fn_with_state(key, docs_auth_middleware))
}

/// Swagger UI page; assets come from the unpkg CDN.
const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ModelHub Proxy API - Documentation</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api/docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                persistAuthorization: true
            });
        };
    </script>
</body>
</html>"#;
