//! Hands a successful upstream response back to the client
//!
//! - JSON: the body is collected and returned verbatim
//! - Binary: bytes plus the upstream content headers (TTS audio)
//! - Stream: chunks are piped through unmodified as an event stream

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};

use crate::error::{AppError, AppResult};
use crate::proxy::headers::{copy_allowed_headers, BINARY_RELAY_HEADERS};
use crate::proxy::logging::RequestContext;
use crate::proxy::upstream::{BoxError, UpstreamResponse};
use crate::routes::metrics::record_stream;
use crate::streaming::SseEventCounter;

async fn collect_body(response: UpstreamResponse) -> AppResult<(StatusCode, axum::http::HeaderMap, Bytes)> {
    let UpstreamResponse {
        status,
        headers,
        body,
    } = response;

    let collected = body
        .try_fold(BytesMut::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await
        .map_err(|e| AppError::Transport(format!("Failed to read upstream response: {}", e)))?;

    Ok((status, headers, collected.freeze()))
}

/// Relay a JSON response body unchanged.
///
/// A success body that is not JSON keeps its upstream content type.
pub async fn relay_json(response: UpstreamResponse) -> AppResult<Response> {
    let (status, headers, body) = collect_body(response).await?;

    let content_type = if serde_json::from_slice::<serde::de::IgnoredAny>(&body).is_ok() {
        HeaderValue::from_static("application/json")
    } else {
        headers
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"))
    };

    Ok((status, [(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Relay raw bytes with the upstream content headers.
pub async fn relay_binary(response: UpstreamResponse) -> AppResult<Response> {
    let (status, upstream_headers, body) = collect_body(response).await?;

    let mut headers = copy_allowed_headers(&upstream_headers, BINARY_RELAY_HEADERS);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
    }

    Ok((status, headers, body).into_response())
}

/// Logs stream completion, or an early client disconnect when dropped first.
struct StreamGuard {
    ctx: RequestContext,
    counter: SseEventCounter,
    chunks: usize,
    finished: bool,
}

impl StreamGuard {
    fn observe(&mut self, chunk: &[u8]) {
        self.chunks += 1;
        self.counter.feed(chunk);
    }

    fn finish(&mut self) {
        self.finished = true;
        self.counter.finish();
        self.ctx
            .log_stream_ended(self.chunks, self.counter.events(), self.counter.saw_done());
        record_stream(self.ctx.capability, self.chunks);
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.ctx.log_client_disconnect(self.chunks);
        }
    }
}

/// Pipe an upstream event stream to the client byte-for-byte.
///
/// The first chunk is awaited before headers are sent, so an upstream failure
/// that yields no bytes still becomes a JSON error. Once bytes are flowing a
/// failure can only end the connection.
pub async fn relay_stream(response: UpstreamResponse, ctx: RequestContext) -> AppResult<Response> {
    let mut upstream = response.body;

    let first = match upstream.next().await {
        Some(Ok(chunk)) => Some(chunk),
        Some(Err(e)) => {
            ctx.log_error(&e.to_string());
            return Err(AppError::Transport(format!("Upstream stream failed: {}", e)));
        }
        None => None,
    };

    ctx.log_stream_started();

    let mut guard = StreamGuard {
        ctx,
        counter: SseEventCounter::new(),
        chunks: 0,
        finished: false,
    };

    let relayed = async_stream::stream! {
        if let Some(chunk) = first {
            guard.observe(&chunk);
            yield Ok::<Bytes, BoxError>(chunk);
        }

        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) => {
                    guard.observe(&chunk);
                    yield Ok(chunk);
                }
                Err(e) => {
                    guard.ctx.log_error(&format!("stream interrupted: {}", e));
                    guard.finished = true;
                    yield Err(e);
                    break;
                }
            }
        }

        if !guard.finished {
            guard.finish();
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(relayed))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))
}
