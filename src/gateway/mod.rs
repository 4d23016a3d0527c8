//! HTTP gateway to the AI backend
//!
//! Every request goes through [`GatewayClient`], which attaches the bearer
//! token (when one is stored) and a request timestamp, unwraps successful
//! JSON bodies and classifies failures by HTTP status. The service groups in
//! the submodules are thin wrappers that log a call-specific diagnostic and
//! re-raise.

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::CredentialStore;
use crate::config::GatewayConfig;

pub mod ai;
pub mod app;
pub mod files;

pub use ai::AiService;
pub use app::AppService;
pub use files::FileService;

/// Header carrying the client-side send time in epoch milliseconds
pub const REQUEST_TIME_HEADER: &str = "X-Request-Time";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("unauthorized access")]
    Unauthorized,

    #[error("forbidden access")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("server error")]
    Server,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl GatewayError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Network(err)
        }
    }

    /// HTTP status behind this error, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Unauthorized => Some(401),
            GatewayError::Forbidden => Some(403),
            GatewayError::NotFound => Some(404),
            GatewayError::Server => Some(500),
            GatewayError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Authenticated JSON client bound to one base URL
pub struct GatewayClient {
    base_url: String,
    client: Client,
    credentials: Arc<dyn CredentialStore>,
}

impl GatewayClient {
    pub fn new(
        config: &GatewayConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(GatewayError::Build)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, GatewayError> {
        let builder = self.request(Method::GET, path).query(query);
        self.send(builder).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Value, GatewayError> {
        let builder = self.request(Method::POST, path).json(body);
        self.send(builder).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Value, GatewayError> {
        let builder = self.request(Method::PUT, path).json(body);
        self.send(builder).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_TIME_HEADER, Utc::now().timestamp_millis().to_string());

        if let Some(token) = self.credentials.token() {
            builder = builder.bearer_auth(token);
        }

        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, GatewayError> {
        let response = builder.send().await.map_err(|e| {
            let err = GatewayError::from_transport(e);
            tracing::error!("Gateway request failed: {}", err);
            err
        })?;

        if response.status().is_success() {
            return Self::unwrap_body(response).await;
        }

        Err(self.classify_failure(response).await)
    }

    async fn unwrap_body(response: Response) -> Result<Value, GatewayError> {
        let bytes = response.bytes().await.map_err(GatewayError::from_transport)?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(GatewayError::Decode)
    }

    async fn classify_failure(&self, response: Response) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Err(e) = self.credentials.clear() {
                    tracing::warn!("Failed to clear stored credential: {:#}", e);
                }
                tracing::error!("Unauthorized access");
                GatewayError::Unauthorized
            }
            StatusCode::FORBIDDEN => {
                tracing::error!("Forbidden access");
                GatewayError::Forbidden
            }
            StatusCode::NOT_FOUND => {
                tracing::error!("Resource not found");
                GatewayError::NotFound
            }
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Server error");
                GatewayError::Server
            }
            _ => {
                let message = error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
                tracing::error!("API error: {}", message);
                GatewayError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

/// `message` field of a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}
