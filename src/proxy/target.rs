//! Where and how to reach an upstream provider for one request

use std::fmt;

use crate::error::{AppError, AppResult};
use crate::proxy::sanitize::{clean_api_key, clean_url};
use crate::proxy::validate::is_valid_url;

/// Upstream provider coordinates, built fresh from each request body.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderTarget {
    pub url: String,
    pub api_key: String,
    pub model_name: Option<String>,
}

impl ProviderTarget {
    /// Clean the raw caller-supplied values and validate the URL.
    pub fn new(raw_url: &str, raw_key: &str) -> AppResult<Self> {
        let url = clean_url(raw_url);
        if !is_valid_url(&url) {
            return Err(AppError::BadRequest(format!(
                "Invalid accessUrl: {url:?} is not an absolute http(s) URL"
            )));
        }

        let api_key = clean_api_key(raw_key);
        if api_key.is_empty() {
            return Err(AppError::MissingFields(vec!["accessKey"]));
        }

        Ok(Self {
            url,
            api_key,
            model_name: None,
        })
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        self.model_name = Some(model_name.trim().to_string()).filter(|m| !m.is_empty());
        self
    }

    /// Join the base URL with a capability path.
    ///
    /// Callers sometimes paste the full endpoint instead of the base URL, in
    /// which case it is used unchanged.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        if base.ends_with(path) {
            base.to_string()
        } else {
            format!("{base}{path}")
        }
    }
}

// API keys stay out of logs.
impl fmt::Debug for ProviderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTarget")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .finish()
    }
}
