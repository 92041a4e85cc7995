//! REST client for the HavenWelfare backend.
//!
//! [`ApiClient`] is the single point of outbound HTTP communication. Every
//! request carries the current bearer token (read from a [`TokenSource`]
//! at send time), and every 401 answer is announced on the [`EventBus`] as
//! [`SessionEvent::unauthenticated`] so the session store can force a
//! logout. The client itself never touches session state or navigation.
//!
//! No retries and no backoff happen here: failures are returned to the
//! caller as-is.

use std::sync::Arc;

use chrono::Utc;
use haven_core::CoreError;
use haven_events::{EventBus, SessionEvent};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;

/// Supplies the bearer token attached to outgoing requests.
///
/// Implemented by the durable credential store so that every request sees
/// the token as it is stored right now, without call-site repetition.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token source for clients that never authenticate (public pages, tests).
pub struct NoToken;

impl TokenSource for NoToken {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Body of an outgoing request.
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

impl RequestBody {
    /// Serialize a typed payload into a JSON body.
    pub fn json<T: Serialize + ?Sized>(payload: &T) -> Result<Self, ApiError> {
        Ok(RequestBody::Json(serde_json::to_value(payload)?))
    }
}

/// Query string pairs. Absent optional filters are simply left out.
pub type Query<'a> = &'a [(&'a str, String)];

/// Build query pairs from optional filters, dropping the `None`s.
pub(crate) fn filters<'a>(pairs: &[(&'a str, Option<&str>)]) -> Vec<(&'a str, String)> {
    pairs
        .iter()
        .filter_map(|(key, value)| value.map(|v| (*key, v.to_string())))
        .collect()
}

/// Build an API path from its segments. Each segment is percent-encoded,
/// so an id containing `/`, `?` or `#` stays inside its own segment.
pub(crate) fn endpoint(segments: &[&str]) -> Result<String, ApiError> {
    let mut url = reqwest::Url::parse("http://api.invalid/")
        .map_err(|e| ApiError::Invalid(CoreError::Validation(e.to_string())))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Invalid(CoreError::Validation("URL cannot carry a path".into())))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Errors from the API client layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered 401. Already signalled on the event bus.
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// The backend returned any other non-2xx status code.
    #[error("Backend error ({status}): {message}")]
    Status {
        status: u16,
        /// The backend's `detail` text when present, else the raw body.
        message: String,
    },

    /// A 2xx body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Input rejected before anything was sent.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// A file selected for upload could not be read.
    #[error("Failed to read upload: {0}")]
    Upload(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status code, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthenticated { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the failure says nothing about the credentials: the network
    /// dropped or the server broke. Retrying may help.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Text suitable for showing to the user verbatim.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unauthenticated { message } | ApiError::Status { message, .. } => {
                message.clone()
            }
            ApiError::Invalid(CoreError::Validation(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// HTTP client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool, token source and bus.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    tokens: Arc<dyn TokenSource>,
    bus: Arc<EventBus>,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(
        config: &ClientConfig,
        tokens: Arc<dyn TokenSource>,
        bus: Arc<EventBus>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config, tokens, bus))
    }

    /// Build a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across multiple clients).
    pub fn with_client(
        http: reqwest::Client,
        config: &ClientConfig,
        tokens: Arc<dyn TokenSource>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            http,
            api_url: config.api_url(),
            tokens,
            bus,
        }
    }

    /// `{backend_url}/api`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The bus 401 signals are published on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Send a request and decode the JSON response.
    ///
    /// `path` is relative to the API base and starts with `/`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: Query<'_>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body, query).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, RequestBody::Empty, &[]).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, RequestBody::Empty, query).await
    }

    pub async fn post_json<B, T>(&self, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, RequestBody::json(payload)?, &[])
            .await
    }

    pub async fn put_json<B, T>(&self, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, RequestBody::json(payload)?, &[])
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, RequestBody::Empty, &[]).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, RequestBody::Multipart(form), &[])
            .await
    }

    // ---- private helpers ----

    /// Attach headers, send, and classify the status code.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        query: Query<'_>,
    ) -> Result<reqwest::Response, ApiError> {
        // Taken before the token is read, so a 401 is never attributed to
        // a session that began after this request picked up its token.
        let sent_at = Utc::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut builder = self
            .http
            .request(method.clone(), format!("{}{}", self.api_url, path))
            .header("x-request-id", &request_id);

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = self.tokens.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(%method, path, request_id = %request_id, error = %e, "API request failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        tracing::debug!(
            %method,
            path,
            request_id = %request_id,
            status = status.as_u16(),
            "API response",
        );

        if status == StatusCode::UNAUTHORIZED {
            let message = Self::error_message(status, response).await;
            tracing::warn!(%method, path, "Backend rejected credentials");
            self.bus.publish(SessionEvent::unauthenticated(path, sent_at));
            return Err(ApiError::Unauthenticated { message });
        }

        if !status.is_success() {
            let message = Self::error_message(status, response).await;
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Extract the user-visible message from an error response.
    async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        extract_detail(&body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body
            }
        })
    }
}

/// Pull the backend's `detail` out of an error body.
///
/// `detail` is either a plain string or, for request-shape errors, a list
/// of `{ "msg": ... }` objects.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}
