//! reqwest-based chat-completion client

use super::protocol::{ChatRequest, ChatResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crosscheck_application::{BackendClient, Completion, CompletionRequest, TransportError};
use crosscheck_domain::truncate;
use reqwest::{Client, StatusCode, header};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY: usize = 500;

/// Client for OpenAI-compatible `POST {base_url}/chat/completions` endpoints.
///
/// One client serves every backend; the base URL is looked up by backend
/// name. Per-attempt timeouts are enforced by the caller, so the reqwest
/// client only carries a connect timeout.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoints: HashMap<String, String>,
}

impl ChatCompletionsClient {
    /// `endpoints` maps backend name to base URL (e.g. `https://api.example.com/v1`).
    pub fn new(endpoints: HashMap<String, String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("crosscheck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, endpoints })
    }

    fn url_for(&self, backend: &str) -> Result<String, TransportError> {
        self.endpoints
            .get(backend)
            .map(|base| format!("{}/chat/completions", base.trim_end_matches('/')))
            .ok_or_else(|| TransportError::Other(format!("no base_url for backend '{}'", backend)))
    }
}

#[async_trait]
impl BackendClient for ChatCompletionsClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        api_key: &str,
    ) -> Result<Completion, TransportError> {
        let url = self.url_for(&request.backend)?;
        debug!(backend = %request.backend, url = %url, "POST chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&ChatRequest::from(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after, &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        body.into_completion()
    }
}

/// Convert a reqwest send failure into the transport taxonomy.
fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() {
        TransportError::Unreachable(e.to_string())
    } else if e.is_decode() || e.is_body() {
        TransportError::InvalidResponse(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

fn error_for_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> TransportError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        TransportError::RateLimited {
            status: status.as_u16(),
            message: truncate(body, MAX_ERROR_BODY),
            retry_after,
        }
    } else {
        TransportError::Http {
            status: status.as_u16(),
            body: truncate(body, MAX_ERROR_BODY),
        }
    }
}

/// Parse a `Retry-After` value: delay in seconds, or an HTTP date.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    (at - now).to_std().ok()
}
