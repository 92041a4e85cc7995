use std::time::Duration;

/// Default backend origin for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the backend REST API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin without the `/api` suffix, e.g. `https://haven.example.org`.
    pub backend_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

/// Malformed configuration value.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl ClientConfig {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            user_agent: format!("haven-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                  |
    /// |------------------------------|--------------------------|
    /// | `HAVEN_BACKEND_URL`          | `http://localhost:8000`  |
    /// | `HAVEN_REQUEST_TIMEOUT_SECS` | `30` (`0` disables)      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url =
            std::env::var("HAVEN_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());

        let raw_timeout = std::env::var("HAVEN_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string());
        let timeout_secs: u64 = raw_timeout.trim().parse().map_err(|_| ConfigError {
            var: "HAVEN_REQUEST_TIMEOUT_SECS",
            expected: "a whole number of seconds",
            value: raw_timeout.clone(),
        })?;

        let mut config = Self::new(backend_url);
        config.request_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
        Ok(config)
    }

    /// Base URL every API path is appended to: `{backend_url}/api`.
    pub fn api_url(&self) -> String {
        format!("{}/api", self.backend_url.trim_end_matches('/'))
    }
}
