//! Text Generator Port - interface to the text generation service.
//!
//! The persona generator sends a single prompt and expects free-form text
//! back, possibly JSON-shaped and possibly wrapped in formatting noise.
//! Parsing and validation of the reply live above this port; the port only
//! moves text and classifies transport failures.

use async_trait::async_trait;
use thiserror::Error;

/// Port for the external text generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for the given request. Implementations must enforce a
    /// timeout; a hung call is reported as [`GenerationError::Timeout`].
    async fn complete(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Natural-language instruction for the model.
    pub prompt: String,
    /// Hint describing the reply shape we want, e.g. a JSON schema sketch.
    pub response_shape: Option<String>,
    /// Upper bound on generated length, when the service supports it.
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Creates a request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_shape: None,
            max_tokens: None,
        }
    }

    /// Sets the response shape hint.
    pub fn with_response_shape(mut self, shape: impl Into<String>) -> Self {
        self.response_shape = Some(shape.into());
        self
    }

    /// Sets the generation length bound.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// Text generation service errors.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Rate limited by the service.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// API key rejected.
    #[error("generation service authentication failed")]
    AuthenticationFailed,

    /// Service reported an internal failure.
    #[error("generation service unavailable: {message}")]
    Unavailable { message: String },

    /// Network failure during the request.
    #[error("generation network error: {0}")]
    Network(String),

    /// Reply body could not be read.
    #[error("generation reply unreadable: {0}")]
    Parse(String),

    /// The request was rejected as invalid.
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    /// Request exceeded the configured timeout.
    #[error("generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl GenerationError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// True when retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited { .. }
                | GenerationError::Unavailable { .. }
                | GenerationError::Network(_)
                | GenerationError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_works() {
        let request = GenerationRequest::new("write a note")
            .with_response_shape(r#"{"title": string, "body": string}"#)
            .with_max_tokens(200);

        assert_eq!(request.prompt, "write a note");
        assert!(request.response_shape.unwrap().contains("title"));
        assert_eq!(request.max_tokens, Some(200));
    }

    #[test]
    fn retryable_classification() {
        assert!(GenerationError::rate_limited(30).is_retryable());
        assert!(GenerationError::unavailable("down").is_retryable());
        assert!(GenerationError::network("reset").is_retryable());
        assert!(GenerationError::Timeout { timeout_secs: 30 }.is_retryable());

        assert!(!GenerationError::AuthenticationFailed.is_retryable());
        assert!(!GenerationError::parse("bad json").is_retryable());
        assert!(!GenerationError::InvalidRequest("empty".into()).is_retryable());
    }

    #[test]
    fn errors_display_with_detail() {
        let err = GenerationError::rate_limited(30);
        assert_eq!(err.to_string(), "rate limited: retry after 30s");

        let err = GenerationError::Timeout { timeout_secs: 15 };
        assert_eq!(err.to_string(), "generation timed out after 15s");
    }
}
