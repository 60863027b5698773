// crates/tradedesk-cli/src/gateway_client.rs
// ============================================================================
// Module: HTTP Gateway Client
// Description: HTTP(S) transport implementing the gateway interface.
// Purpose: Execute gateway requests with Basic auth, timeouts, and size caps.
// Dependencies: reqwest, serde_json, url, tradedesk-config, tradedesk-core
// ============================================================================

//! ## Overview
//! [`HttpGateway`] turns a [`GatewayRequest`] into one HTTP call against the
//! configured base URL. Redirects are not followed, bodies are capped at
//! [`MAX_GATEWAY_RESPONSE_BYTES`], and the client never retries.
//!
//! Security posture: responses are untrusted; apply size limits, fail closed
//! on transport errors, and never log credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;
use tradedesk_config::ConfigError;
use tradedesk_config::GatewayConfig;
use tradedesk_core::Gateway;
use tradedesk_core::GatewayError;
use tradedesk_core::GatewayRequest;
use tradedesk_core::Method;
use tradedesk_core::RequestBody;
use url::Url;
use url::form_urlencoded;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum gateway response body size accepted by the CLI.
pub const MAX_GATEWAY_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// Maximum characters of a non-JSON error body echoed in messages.
const ERROR_PREVIEW_CHARS: usize = 240;

// ============================================================================
// SECTION: Types
// ============================================================================

/// HTTP gateway client configuration.
///
/// # Invariants
/// - `base_url` uses http or https.
/// - `password` is only set together with `username`.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    /// Gateway base URL; request paths are appended to its path.
    pub base_url: Url,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Default request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGatewayConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpGatewayConfig {
    /// Builds client settings from the `[gateway]` section. Returns `None`
    /// when no URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is malformed.
    pub fn from_config(config: &GatewayConfig) -> Result<Option<Self>, ConfigError> {
        let Some(base_url) = config.base_url()? else {
            return Ok(None);
        };
        Ok(Some(Self {
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: config.request_timeout(),
        }))
    }
}

/// Gateway client errors.
///
/// # Invariants
/// - String payloads may include untrusted server text.
#[derive(Debug, Error)]
pub enum GatewayClientError {
    /// Client construction failed.
    #[error("gateway client config error: {0}")]
    Config(String),
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Response size exceeds limits.
    #[error("gateway response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
}

impl From<GatewayClientError> for GatewayError {
    fn from(error: GatewayClientError) -> Self {
        match error {
            GatewayClientError::Config(_) => Self::NotConfigured(error.to_string()),
            GatewayClientError::Transport(_) => Self::Unavailable(error.to_string()),
            GatewayClientError::ResponseTooLarge {
                ..
            } => Self::Protocol(error.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Gateway reached over HTTP(S).
pub struct HttpGateway {
    /// Shared HTTP client.
    client: Client,
    /// Connection settings.
    config: HttpGatewayConfig,
}

impl HttpGateway {
    /// Creates a client with redirects disabled.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayClientError::Config`] when the HTTP client cannot be
    /// built.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| GatewayClientError::Config(err.to_string()))?;
        Ok(Self {
            client,
            config,
        })
    }

    /// Returns the connection settings.
    #[must_use]
    pub const fn config(&self) -> &HttpGatewayConfig {
        &self.config
    }

    /// Resolves the absolute URL of a request, query included.
    #[must_use]
    pub fn endpoint(&self, request: &GatewayRequest) -> Url {
        let mut url = self.config.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base_path}{}", request.path));
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        url
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError> {
        let url = self.endpoint(&request);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, url).header(ACCEPT, "application/json");
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(username) = &self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_ref());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|err| GatewayError::Protocol(err.to_string()))?;
                builder.header(CONTENT_TYPE, "application/json").body(bytes)
            }
            RequestBody::Text(text) => {
                builder.header(CONTENT_TYPE, "text/plain; charset=utf-8").body(text)
            }
            RequestBody::Form(fields) => {
                let encoded =
                    form_urlencoded::Serializer::new(String::new()).extend_pairs(fields.iter()).finish();
                builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded").body(encoded)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|err| GatewayClientError::Transport(err.to_string()))?;
        let status = response.status();
        let body = read_response_body_with_limit(response, MAX_GATEWAY_RESPONSE_BYTES).await?;
        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &body));
        }
        Ok(decode_payload(&body))
    }
}

// ============================================================================
// SECTION: Response Handling
// ============================================================================

/// Reads a response body, failing once it exceeds `limit` bytes.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, GatewayClientError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| GatewayClientError::Transport(err.to_string()))?
    {
        let next_total =
            total.checked_add(chunk.len()).ok_or(GatewayClientError::ResponseTooLarge {
                actual: usize::MAX,
                limit,
            })?;
        if next_total > limit {
            return Err(GatewayClientError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}

/// Decodes a success body: empty is `null`, JSON is parsed, anything else
/// becomes a string.
#[must_use]
pub fn decode_payload(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// Builds a [`GatewayError::Remote`] from a non-success response.
#[must_use]
pub fn remote_error(status: u16, body: &[u8]) -> GatewayError {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|value| value.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let category = field("category").unwrap_or_else(|| status_category(status));
    let message = field("message").or_else(|| field("msg")).unwrap_or_else(|| {
        let text = String::from_utf8_lossy(body);
        let preview: String = text.trim().chars().take(ERROR_PREVIEW_CHARS).collect();
        if preview.is_empty() { format!("http status {status}") } else { preview }
    });
    GatewayError::Remote {
        category,
        message,
    }
}

/// Maps an HTTP status to an error category label.
#[must_use]
pub fn status_category(status: u16) -> String {
    match status {
        400 => "bad_request".to_string(),
        401 => "unauthorized".to_string(),
        403 => "forbidden".to_string(),
        404 => "not_found".to_string(),
        409 => "conflict".to_string(),
        500 ..= 599 => "server_error".to_string(),
        other => format!("http_{other}"),
    }
}

// ============================================================================
// SECTION: Unconfigured Gateway
// ============================================================================

/// Gateway used when no URL is configured; every call fails with
/// [`GatewayError::NotConfigured`]. Local operations never reach it.
pub struct UnconfiguredGateway {
    /// Explanation shown to the user.
    reason: String,
}

impl UnconfiguredGateway {
    /// Creates a placeholder gateway.
    #[must_use]
    pub const fn new(reason: String) -> Self {
        Self {
            reason,
        }
    }
}

#[async_trait]
impl Gateway for UnconfiguredGateway {
    async fn call(&self, _request: GatewayRequest) -> Result<Value, GatewayError> {
        Err(GatewayError::NotConfigured(self.reason.clone()))
    }
}
