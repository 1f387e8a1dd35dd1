//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `CYCLE_COMPANION` prefix and nested values use double underscores as
//! separators. Missing credentials for any of the three collaborators are
//! setup errors: the scheduler must refuse to start rather than run a
//! partial pipeline.
//!
//! # Example
//!
//! ```no_run
//! use cycle_companion::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod push;
mod store;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use push::PushConfig;
pub use store::StoreConfig;

use serde::Deserialize;

/// Root application configuration
///
/// One section per external collaborator. Load using [`AppConfig::load()`]
/// which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Record store (cycles, subscribers, notification log)
    pub store: StoreConfig,

    /// Text generation service
    pub ai: AiConfig,

    /// Push delivery gateway
    pub push: PushConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `CYCLE_COMPANION` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CYCLE_COMPANION__STORE__BASE_URL=...` -> `store.base_url = ...`
    /// - `CYCLE_COMPANION__AI__API_KEY=...` -> `ai.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required environment variables are missing
    /// or values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CYCLE_COMPANION")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.ai.validate()?;
        self.push.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("CYCLE_COMPANION__STORE__BASE_URL", "https://store.example/api");
        env::set_var("CYCLE_COMPANION__STORE__API_TOKEN", "store-token");
        env::set_var("CYCLE_COMPANION__AI__API_KEY", "sk-test");
        env::set_var("CYCLE_COMPANION__PUSH__GATEWAY_URL", "https://push.example");
        env::set_var("CYCLE_COMPANION__PUSH__API_TOKEN", "push-token");
    }

    fn clear_env() {
        env::remove_var("CYCLE_COMPANION__STORE__BASE_URL");
        env::remove_var("CYCLE_COMPANION__STORE__API_TOKEN");
        env::remove_var("CYCLE_COMPANION__STORE__TIMEOUT_SECS");
        env::remove_var("CYCLE_COMPANION__AI__API_KEY");
        env::remove_var("CYCLE_COMPANION__AI__MODEL");
        env::remove_var("CYCLE_COMPANION__PUSH__GATEWAY_URL");
        env::remove_var("CYCLE_COMPANION__PUSH__API_TOKEN");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.store.base_url, "https://store.example/api");
        assert_eq!(config.push.gateway_url, "https://push.example");
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_applied() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.store.timeout_secs, 10);
        assert_eq!(config.ai.timeout_secs, 30);
        assert_eq!(config.ai.max_retries, 2);
        assert_eq!(config.ai.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_missing_credentials_fail_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_store_url_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("CYCLE_COMPANION__STORE__BASE_URL", "ftp://store");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStoreUrl)
        ));
    }
}
