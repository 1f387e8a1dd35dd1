//! Push Sender Port - per-subscriber notification delivery.
//!
//! The delivery service takes a destination descriptor and an opaque
//! payload and reports success or failure per destination. One subscriber's
//! failure never affects another; the dispatcher treats each send as an
//! isolated attempt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{LedgerEntry, NotificationType, PersonaMessage, Subscriber};

/// The payload envelope delivered to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    /// Deterministic notification id, shared with the ledger entry.
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub sent_at: DateTime<Utc>,
}

impl PushPayload {
    /// Builds the payload for a message sent at `sent_at`.
    ///
    /// Shares its id derivation with [`LedgerEntry`] so the client can
    /// correlate a delivered notification with the log.
    pub fn new(
        notification_type: NotificationType,
        message: &PersonaMessage,
        sent_at: DateTime<Utc>,
    ) -> Self {
        let entry = LedgerEntry::new(notification_type, message, sent_at);
        Self::from_entry(&entry)
    }

    /// Builds the payload matching an existing ledger entry.
    pub fn from_entry(entry: &LedgerEntry) -> Self {
        Self {
            title: entry.title.clone(),
            body: entry.body.clone(),
            id: entry.id.clone(),
            notification_type: entry.notification_type,
            sent_at: entry.sent_at,
        }
    }
}

/// Port for the push delivery service.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Attempts delivery to a single subscriber.
    async fn send(&self, subscriber: &Subscriber, payload: &PushPayload)
        -> Result<(), PushError>;
}

/// Per-destination delivery errors.
#[derive(Debug, Clone, Error)]
pub enum PushError {
    /// The subscription no longer exists at the push service (404/410).
    #[error("subscription gone (status {status})")]
    SubscriptionGone { status: u16 },

    /// The push service rejected the delivery.
    #[error("delivery rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Network failure before a status was received.
    #[error("push network error: {0}")]
    Network(String),

    /// Delivery attempt exceeded the configured timeout.
    #[error("push timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl PushError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected { status, message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// The status code reported by the service, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            PushError::SubscriptionGone { status } | PushError::Rejected { status, .. } => {
                Some(*status)
            }
            PushError::Network(_) | PushError::Timeout { .. } => None,
        }
    }
}
