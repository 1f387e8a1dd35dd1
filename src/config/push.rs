//! Push gateway configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Push gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Base URL of the push gateway
    pub gateway_url: String,

    /// Bearer token for the gateway
    pub api_token: Secret<String>,

    /// Per-delivery timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PushConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate push configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.gateway_url.starts_with("http") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if self.api_token.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PUSH__API_TOKEN"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    10
}
