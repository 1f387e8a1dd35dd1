//! HTTP Document Store - record store adapter over a REST document API.
//!
//! Documents live at `{base_url}/documents/{name}`. Reads return the stored
//! value together with an opaque `version` token; writes echo that token as
//! `expectedVersion` so the store can reject lost updates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::ports::{Document, DocumentStore, DocumentVersion, StoreError};

/// Configuration for the HTTP document store.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Bearer token for the record store API.
    api_token: Secret<String>,
    /// Base URL of the document API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpStoreConfig {
    /// Creates a configuration with the given base URL and token.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_token: Secret::new(api_token.into()),
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_token(&self) -> &str {
        self.api_token.expose_secret()
    }
}

/// Record store adapter backed by a REST document API.
pub struct HttpDocumentStore {
    config: HttpStoreConfig,
    client: Client,
}

impl HttpDocumentStore {
    /// Creates a new store adapter.
    pub fn new(config: HttpStoreConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn document_url(&self, name: &str) -> String {
        format!("{}/documents/{}", self.config.base_url.trim_end_matches('/'), name)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::network(format!(
                "timed out after {}s",
                self.config.timeout.as_secs()
            ))
        } else {
            StoreError::network(error.to_string())
        }
    }

    async fn fail_from_status(&self, name: &str, response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::AuthenticationFailed,
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                StoreError::version_conflict(name)
            }
            _ => StoreError::unexpected(status.as_u16(), body),
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn read(&self, name: &str) -> Result<Document, StoreError> {
        let response = self
            .client
            .get(self.document_url(name))
            .bearer_auth(self.config.api_token())
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        // A document that was never written yet reads as empty, not as an
        // error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Document::missing());
        }

        if !response.status().is_success() {
            return Err(self.fail_from_status(name, response).await);
        }

        let stored: StoredDocument = response
            .json()
            .await
            .map_err(|e| StoreError::malformed(e.to_string()))?;

        Ok(Document {
            value: Some(stored.value),
            version: Some(DocumentVersion::new(stored.version)),
        })
    }

    async fn write(
        &self,
        name: &str,
        value: serde_json::Value,
        expected_version: Option<&DocumentVersion>,
    ) -> Result<DocumentVersion, StoreError> {
        let request = WriteRequest {
            value,
            expected_version: expected_version.map(|v| v.as_str().to_string()),
        };

        let response = self
            .client
            .put(self.document_url(name))
            .bearer_auth(self.config.api_token())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            return Err(self.fail_from_status(name, response).await);
        }

        let written: WriteResponse = response
            .json()
            .await
            .map_err(|e| StoreError::malformed(e.to_string()))?;

        Ok(DocumentVersion::new(written.version))
    }
}

// ----- Wire types -----

#[derive(Debug, Deserialize)]
struct StoredDocument {
    version: String,
    value: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteRequest {
    value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_builder() {
        let config = HttpStoreConfig::new("https://store.example/api", "token")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.base_url, "https://store.example/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_token(), "token");
    }

    #[test]
    fn document_url_joins_without_double_slash() {
        let store = HttpDocumentStore::new(HttpStoreConfig::new("https://store.example/api/", "t"));
        assert_eq!(
            store.document_url("notification-log"),
            "https://store.example/api/documents/notification-log"
        );
    }

    #[test]
    fn write_request_omits_missing_version() {
        let request = WriteRequest {
            value: serde_json::json!([]),
            expected_version: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("expectedVersion"));

        let request = WriteRequest {
            value: serde_json::json!([]),
            expected_version: Some("abc123".to_string()),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"expectedVersion\":\"abc123\""));
    }
}
