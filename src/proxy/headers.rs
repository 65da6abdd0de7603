//! Header utilities for upstream proxying
//!
//! Client headers are never forwarded upstream: the outbound request carries
//! only the caller-supplied provider key. Relayed responses copy back a small
//! allowlist of upstream headers.

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, ACCEPT, AUTHORIZATION,
    CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE,
};

/// Upstream headers copied onto binary relays
pub const BINARY_RELAY_HEADERS: &[HeaderName] = &[CONTENT_TYPE, CONTENT_LENGTH, CONTENT_DISPOSITION];

/// Build the headers for a request to an upstream provider.
///
/// Fails when the API key contains bytes that cannot appear in a header.
pub fn build_upstream_headers(
    api_key: &str,
    accept: &'static str,
    content_type: Option<&'static str>,
) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static(accept));

    // Multipart bodies set their own boundary-bearing content type.
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    Ok(headers)
}

/// Copy the allowlisted headers from an upstream response.
pub fn copy_allowed_headers(upstream: &HeaderMap, allowed: &[HeaderName]) -> HeaderMap {
    let mut copied = HeaderMap::new();

    for name in allowed {
        if let Some(value) = upstream.get(name) {
            copied.insert(name.clone(), value.clone());
        }
    }

    copied
}
