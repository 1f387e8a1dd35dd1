//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Store base URL must be http(s)")]
    InvalidStoreUrl,

    #[error("Generation service base URL must be http(s)")]
    InvalidGenerationUrl,

    #[error("Push gateway URL must be http(s)")]
    InvalidGatewayUrl,

    #[error("Timeout must be greater than zero")]
    InvalidTimeout,
}
