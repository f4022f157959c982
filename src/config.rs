use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

pub const ENV_BASE_URL: &str = "GYM_HTTP_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "GYM_HTTP_TIMEOUT_MS";
/// Ambient credential for uploads.
pub const ENV_API_KEY: &str = "OPENAI_GYM_API_KEY";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

/// Client settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service root, e.g. `http://host:port`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request time bound in milliseconds, applied by the transport.
    /// `None` waits forever.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Default API key for uploads.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), timeout_ms: None, api_key: None }
    }
}

impl ClientConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Bound each request by `timeout`, kept to millisecond precision. A
    /// nonzero timeout never rounds down to zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.timeout_ms = Some(if ms == 0 && !timeout.is_zero() { 1 } else { ms });
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Read settings from `GYM_HTTP_BASE_URL`, `GYM_HTTP_TIMEOUT_MS` and
    /// `OPENAI_GYM_API_KEY`. Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let non_empty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        Self {
            base_url: non_empty(ENV_BASE_URL).unwrap_or_else(default_base_url),
            timeout_ms: non_empty(ENV_TIMEOUT_MS).and_then(|v| v.trim().parse().ok()),
            api_key: non_empty(ENV_API_KEY),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The base URL without trailing slashes, ready to prefix a route.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
