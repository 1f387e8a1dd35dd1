//! HTTP Push Sender - delivery through a push gateway.
//!
//! Posts `{destination, payload}` to the gateway's send endpoint and maps
//! the per-destination status code onto `PushError`. A 404 or 410 means the
//! subscription no longer exists and is reported distinctly so the caller
//! can log it as churn rather than a delivery fault.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;

use crate::domain::Subscriber;
use crate::ports::{PushError, PushPayload, PushSender};

/// Configuration for the push gateway.
#[derive(Debug, Clone)]
pub struct PushGatewayConfig {
    /// Bearer token for the gateway.
    api_token: Secret<String>,
    /// Base URL of the gateway.
    pub base_url: String,
    /// Per-delivery timeout.
    pub timeout: Duration,
}

impl PushGatewayConfig {
    /// Creates a configuration with the given base URL and token.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_token: Secret::new(api_token.into()),
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the per-delivery timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_token(&self) -> &str {
        self.api_token.expose_secret()
    }
}

/// Push delivery adapter over a gateway HTTP API.
pub struct HttpPushSender {
    config: PushGatewayConfig,
    client: Client,
}

impl HttpPushSender {
    /// Creates a new sender.
    pub fn new(config: PushGatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn send_url(&self) -> String {
        format!("{}/send", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(
        &self,
        subscriber: &Subscriber,
        payload: &PushPayload,
    ) -> Result<(), PushError> {
        let request = DeliveryRequest {
            destination: Destination {
                endpoint: &subscriber.endpoint,
                keys: Keys {
                    p256dh: &subscriber.keys.p256dh,
                    auth: &subscriber.keys.auth,
                },
            },
            payload,
        };

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(self.config.api_token())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PushError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else {
                    PushError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(PushError::SubscriptionGone { status: status.as_u16() })
            }
            _ => Err(PushError::rejected(status.as_u16(), message)),
        }
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct DeliveryRequest<'a> {
    destination: Destination<'a>,
    payload: &'a PushPayload,
}

#[derive(Debug, Serialize)]
struct Destination<'a> {
    endpoint: &'a str,
    keys: Keys<'a>,
}

#[derive(Debug, Serialize)]
struct Keys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}
