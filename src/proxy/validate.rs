//! Request validation for proxy routes
//!
//! Every check here runs before any outbound call is made.

use reqwest::Url;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::proxy::capability::Capability;

/// Whether `candidate` parses as an absolute http(s) URL with a host.
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

/// Reject targets outside the provider domain a gated capability supports.
///
/// The host must be the domain itself or one of its subdomains.
pub fn ensure_provider_domain(url: &str, domain: &str, capability: Capability) -> AppResult<()> {
    let host_matches = Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == domain || host.ends_with(&format!(".{domain}")));

    if host_matches {
        Ok(())
    } else {
        Err(AppError::UnsupportedProvider {
            capability: capability.description(),
            domain: domain.to_string(),
        })
    }
}

/// Collects absent fields so a single 400 can name all of them.
///
/// A field is absent when it is missing, `null`, or a blank string.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a required string, recording it as missing when blank.
    pub fn text(&mut self, name: &'static str, value: Option<String>) -> String {
        match value {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    /// Take a required JSON object such as a forwarded `requestBody`.
    pub fn object(&mut self, name: &'static str, value: Option<Value>) -> Map<String, Value> {
        match value {
            Some(Value::Object(map)) => map,
            _ => {
                self.missing.push(name);
                Map::new()
            }
        }
    }

    /// Check that a forwarded payload carries each of `keys`.
    pub fn keys_in(&mut self, payload: &Map<String, Value>, keys: &[&'static str]) {
        for &key in keys {
            if !is_present(payload.get(key)) {
                self.missing.push(key);
            }
        }
    }

    pub fn finish(self) -> AppResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingFields(self.missing))
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(_) => true,
    }
}
