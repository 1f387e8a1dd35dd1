//! Push subscribers as stored by the client.
//!
//! Subscribers are created and managed out of scope of this core; the
//! scheduler only reads them. Disabled subscribers are skipped at dispatch
//! time, never deleted.

use serde::{Deserialize, Serialize};

/// A push subscription endpoint with its encryption keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    /// Delivery endpoint URL issued by the push service.
    pub endpoint: String,
    /// Client encryption keys, opaque to this core.
    pub keys: SubscriptionKeys,
    /// User-controlled settings.
    #[serde(default)]
    pub settings: SubscriberSettings,
}

impl Subscriber {
    /// Whether this subscriber currently wants notifications.
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// A short endpoint form safe for logs.
    pub fn endpoint_tail(&self) -> &str {
        // Endpoints are arbitrary stored strings; walk forward to the next
        // char boundary so the slice never splits a multi-byte character.
        let mut start = self.endpoint.len().saturating_sub(12);
        while !self.endpoint.is_char_boundary(start) {
            start += 1;
        }
        &self.endpoint[start..]
    }
}

/// Web-push key material carried through to the delivery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Per-subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberSettings {
    /// Notifications on or off. Defaults to on for legacy records that
    /// predate the setting.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for SubscriberSettings {
    fn default() -> Self {
        Self { enabled: default_enabled() }
    }
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_enabled() {
        let json = r#"{"endpoint":"https://push.example/abc","keys":{"p256dh":"k1","auth":"k2"}}"#;
        let subscriber: Subscriber = serde_json::from_str(json).unwrap();
        assert!(subscriber.is_enabled());
    }

    #[test]
    fn disabled_flag_round_trips() {
        let json = r#"{
            "endpoint": "https://push.example/abc",
            "keys": {"p256dh": "k1", "auth": "k2"},
            "settings": {"enabled": false}
        }"#;
        let subscriber: Subscriber = serde_json::from_str(json).unwrap();
        assert!(!subscriber.is_enabled());
    }

    #[test]
    fn endpoint_tail_is_short() {
        let subscriber = Subscriber {
            endpoint: "https://push.example/some/very/long/token".to_string(),
            keys: SubscriptionKeys { p256dh: "k1".into(), auth: "k2".into() },
            settings: SubscriberSettings::default(),
        };
        assert_eq!(subscriber.endpoint_tail(), "e/long/token");
        assert!(subscriber.endpoint_tail().len() <= 12);
    }

    #[test]
    fn endpoint_tail_respects_char_boundaries() {
        // The 12-byte cut lands inside the two-byte 'é'.
        let subscriber = Subscriber {
            endpoint: "é12345678901".to_string(),
            keys: SubscriptionKeys { p256dh: "k1".into(), auth: "k2".into() },
            settings: SubscriberSettings::default(),
        };
        assert_eq!(subscriber.endpoint_tail(), "12345678901");
    }

    #[test]
    fn endpoint_tail_handles_multibyte_endpoints() {
        let subscriber = Subscriber {
            endpoint: "https://push.example/tökén-αβγ-🌸12".to_string(),
            keys: SubscriptionKeys { p256dh: "k1".into(), auth: "k2".into() },
            settings: SubscriberSettings::default(),
        };
        // Must not panic; whatever survives the cut is valid UTF-8.
        let tail = subscriber.endpoint_tail();
        assert!(subscriber.endpoint.ends_with(tail));
        assert!(tail.len() <= 12);
    }
}
