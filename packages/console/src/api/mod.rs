//! HTTP client for the language-study backend.

pub mod resource;

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::Config;

pub use resource::{DialoguePhrases, History, KnowledgeBase, Prompts, Resource, Writable};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Every variant's `Display` is the message shown to the operator.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response from the backend: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Decode(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct ConsoleClient {
    base_url: String,
    client: reqwest::Client,
}

impl ConsoleClient {
    pub fn new(config: &Config) -> Self {
        Self::build(&config.backend_url, config.request_timeout)
    }

    pub fn with_base_url(base_url: impl AsRef<str>) -> Self {
        Self::build(base_url.as_ref(), DEFAULT_TIMEOUT)
    }

    fn build(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(
                    error = %err,
                    timeout_ms = timeout.as_millis() as u64,
                    "failed to build HTTP client, falling back to defaults without a timeout"
                );
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for<R: Resource>(&self) -> String {
        format!("{}{}", self.base_url, R::PATH)
    }

    pub async fn fetch<R: Resource>(&self) -> Result<R::Body, ApiError> {
        let url = self.url_for::<R>();
        tracing::debug!(resource = R::NAME, %url, "GET");
        let response = self.client.get(&url).send().await?;
        decode(R::NAME, response).await
    }

    /// Sends the complete representation and returns what the server echoed.
    pub async fn replace<R: Writable>(&self, body: &R::Body) -> Result<R::Body, ApiError> {
        let url = self.url_for::<R>();
        tracing::debug!(resource = R::NAME, %url, "PUT");
        let response = self.client.put(&url).json(body).send().await?;
        decode(R::NAME, response).await
    }
}

async fn decode<T: DeserializeOwned>(
    resource: &'static str,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(|e| {
            let body = String::from_utf8_lossy(&bytes);
            tracing::error!(resource, error = %e, %body, "failed to parse backend response");
            ApiError::Decode(e)
        });
    }

    let message = error_message(status, &bytes);
    tracing::warn!(resource, %status, %message, "backend rejected request");
    Err(ApiError::Status { status, message })
}

/// `detail` from a JSON error body when present, otherwise the status text.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());

    match detail {
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => text,
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => {
            status_text(status)
        }
        Some(other) => other.to_string(),
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
