//! HTTP Text Generator - adapter for the text generation service API.
//!
//! Posts a prompt to `{base_url}/v1/generate` and returns the reply text.
//! Transient failures (rate limits, 5xx, network) are retried with
//! exponential backoff up to the configured attempt count.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::ports::{GenerationError, GenerationRequest, TextGenerator};

/// Configuration for the text generation service.
#[derive(Debug, Clone)]
pub struct GenerationServiceConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model identifier requested from the service.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl GenerationServiceConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-3-haiku-20240307".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    /// Sets the model to request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Text generation adapter over the service's HTTP API.
pub struct HttpTextGenerator {
    config: GenerationServiceConfig,
    client: Client,
}

impl HttpTextGenerator {
    /// Creates a new generator with the given configuration.
    pub fn new(config: GenerationServiceConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn generate_url(&self) -> String {
        format!("{}/v1/generate", self.config.base_url.trim_end_matches('/'))
    }

    fn to_wire_request(&self, request: &GenerationRequest) -> WireRequest {
        WireRequest {
            model: self.config.model.clone(),
            prompt: request.prompt.clone(),
            response_shape: request.response_shape.clone(),
            max_tokens: request.max_tokens.unwrap_or(512),
        }
    }

    async fn send_request(&self, request: &GenerationRequest) -> Result<Response, GenerationError> {
        self.client
            .post(self.generate_url())
            .bearer_auth(self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&self.to_wire_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    GenerationError::network(format!("Connection failed: {}", e))
                } else {
                    GenerationError::network(e.to_string())
                }
            })
    }

    async fn handle_response_status(
        &self,
        response: Response,
    ) -> Result<Response, GenerationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => Err(GenerationError::AuthenticationFailed),
            StatusCode::TOO_MANY_REQUESTS => {
                Err(GenerationError::rate_limited(parse_retry_after(&error_body)))
            }
            StatusCode::BAD_REQUEST => Err(GenerationError::InvalidRequest(error_body)),
            s if s.is_server_error() => Err(GenerationError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(GenerationError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<String, GenerationError> {
        let response = self.handle_response_status(response).await?;

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::parse(format!("Failed to parse response: {}", e)))?;

        Ok(wire.text)
    }
}

/// Pulls a retry-after hint out of the error body, defaulting to 30s.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        if let Some(secs) = parsed.get("retryAfterSecs").and_then(|v| v.as_u64()) {
            return secs as u32;
        }
    }
    30
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn complete(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let mut last_error = GenerationError::network("No attempts made");
        let mut retry_count = 0;

        while retry_count <= self.config.max_retries {
            match self.send_request(&request).await {
                Ok(response) => match self.parse_response(response).await {
                    Ok(text) => return Ok(text),
                    Err(err) => {
                        if !err.is_retryable() || retry_count >= self.config.max_retries {
                            return Err(err);
                        }
                        last_error = err;
                    }
                },
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    last_error = err;
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count);
            sleep(delay).await;
            retry_count += 1;
        }

        Err(last_error)
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_shape: Option<String>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    text: String,
}
