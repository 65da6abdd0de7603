//! Cleanup for user-supplied provider URLs and API keys
//!
//! Values are often pasted from docs or chat windows and arrive wrapped in
//! backticks or quotes, or with a trailing newline.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[`'"\s]"#).expect("URL noise pattern is valid"));

static KEY_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n\t\s]").expect("key noise pattern is valid"));

/// Strip backticks, quotes and whitespace from anywhere in a URL.
pub fn clean_url(raw: &str) -> String {
    URL_NOISE.replace_all(raw.trim(), "").into_owned()
}

/// Strip carriage returns, line feeds, tabs and spaces from an API key.
pub fn clean_api_key(raw: &str) -> String {
    KEY_NOISE.replace_all(raw.trim(), "").into_owned()
}
