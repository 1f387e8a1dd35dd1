//! Mock Push Sender for testing.
//!
//! Records every delivery attempt and fails scripted endpoints, so the
//! dispatcher's per-subscriber isolation can be verified without a gateway.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::Subscriber;
use crate::ports::{PushError, PushPayload, PushSender};

/// Mock sender for tests.
#[derive(Debug, Clone, Default)]
pub struct MockPushSender {
    failures: Arc<Mutex<HashMap<String, PushError>>>,
    deliveries: Arc<Mutex<Vec<(String, PushPayload)>>>,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a rejection for the given endpoint.
    pub fn with_failure(self, endpoint: impl Into<String>, status: u16) -> Self {
        self.failures.lock().unwrap().insert(
            endpoint.into(),
            PushError::rejected(status, "scripted failure"),
        );
        self
    }

    /// Scripts a gone subscription (410) for the given endpoint.
    pub fn with_gone(self, endpoint: impl Into<String>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(endpoint.into(), PushError::SubscriptionGone { status: 410 });
        self
    }

    /// Successful deliveries so far: endpoint plus the payload it received.
    pub fn deliveries(&self) -> Vec<(String, PushPayload)> {
        self.deliveries.lock().unwrap().clone()
    }

    /// Number of successful deliveries.
    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }
}

#[async_trait]
impl PushSender for MockPushSender {
    async fn send(
        &self,
        subscriber: &Subscriber,
        payload: &PushPayload,
    ) -> Result<(), PushError> {
        if let Some(error) = self.failures.lock().unwrap().get(&subscriber.endpoint) {
            return Err(error.clone());
        }

        self.deliveries
            .lock()
            .unwrap()
            .push((subscriber.endpoint.clone(), payload.clone()));
        Ok(())
    }
}
