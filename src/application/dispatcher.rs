//! NotificationDispatcher - orchestration of one scheduler run.
//!
//! A run is short-lived and single-shot: load a snapshot from the record
//! store, decide whether today warrants a notification, fan the message out
//! to enabled subscribers, and record the event in the ledger once. The
//! ledger check happens on the freshly loaded log immediately before the
//! send loop, so a rerun after a crash that already delivered skips
//! cleanly instead of double-sending.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{
    classify, CycleRecord, CycleStats, DayKey, LedgerEntry, NotificationLog, NotificationType,
    Subscriber,
};
use crate::ports::{documents, DocumentStore, PushPayload, PushSender, StoreError};

use super::generator::{MessageCache, PersonaTextGenerator};

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The type that was active today, if any.
    pub notification_type: Option<NotificationType>,
    /// Delivery attempts made (enabled subscribers only).
    pub attempted: usize,
    /// Successful deliveries.
    pub delivered: usize,
    /// True when the ledger already held today's entry and the run skipped
    /// sending entirely.
    pub deduplicated: bool,
}

impl RunReport {
    fn quiet() -> Self {
        Self {
            notification_type: None,
            attempted: 0,
            delivered: 0,
            deduplicated: false,
        }
    }

    fn deduplicated(notification_type: NotificationType) -> Self {
        Self {
            notification_type: Some(notification_type),
            attempted: 0,
            delivered: 0,
            deduplicated: true,
        }
    }
}

/// Unrecoverable run errors.
///
/// Malformed documents and per-subscriber failures are recovered inline;
/// only a store that cannot be reached at all ends the run.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode ledger for persistence: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Orchestrates the daily notification run.
pub struct NotificationDispatcher {
    store: Arc<dyn DocumentStore>,
    push: Arc<dyn PushSender>,
    generator: PersonaTextGenerator,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        push: Arc<dyn PushSender>,
        generator: PersonaTextGenerator,
    ) -> Self {
        Self { store, push, generator }
    }

    /// Executes one run for the instant `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport, DispatchError> {
        // 1. Snapshot the record store. Missing or malformed documents
        //    decode to their defaults.
        let cycles: Vec<CycleRecord> = self
            .store
            .read(documents::CYCLES)
            .await?
            .decode_or_default(documents::CYCLES);
        let subscribers: Vec<Subscriber> = self
            .store
            .read(documents::SUBSCRIBERS)
            .await?
            .decode_or_default(documents::SUBSCRIBERS);
        let log_document = self.store.read(documents::NOTIFICATION_LOG).await?;
        let mut log: NotificationLog = log_document.decode_or_default(documents::NOTIFICATION_LOG);

        // 2. Derive stats. No history means nothing to predict.
        let Some(stats) = CycleStats::from_history(&cycles) else {
            info!("no cycle history recorded, nothing to do");
            return Ok(RunReport::quiet());
        };

        // 3. Classify today in the notification time zone.
        let today = DayKey::from_instant(now);
        let Some(classification) = classify(today.date(), &stats) else {
            info!(day = %today, "no notification due today");
            return Ok(RunReport::quiet());
        };
        let notification_type = classification.notification_type;

        // 4. Dedup check against the freshly loaded ledger, right before
        //    any send.
        if log.was_already_sent(today, notification_type) {
            info!(day = %today, %notification_type, "already sent today, skipping");
            return Ok(RunReport::deduplicated(notification_type));
        }

        // 5. Synthesize the message once, memoized for the run.
        let mut cache = MessageCache::new();
        let message = self
            .generator
            .generate(&mut cache, &classification, &stats)
            .await;

        let entry = LedgerEntry::new(notification_type, &message, now);
        let payload = PushPayload::from_entry(&entry);

        // 6. Fan out to enabled subscribers concurrently. Each attempt is
        //    isolated; one failure never blocks the others.
        let enabled: Vec<&Subscriber> =
            subscribers.iter().filter(|s| s.is_enabled()).collect();
        let attempted = enabled.len();

        let outcomes = join_all(
            enabled
                .iter()
                .map(|subscriber| self.push.send(subscriber, &payload)),
        )
        .await;

        let mut delivered = 0;
        for (subscriber, outcome) in enabled.iter().zip(outcomes) {
            match outcome {
                Ok(()) => delivered += 1,
                Err(push_error) => warn!(
                    endpoint_tail = subscriber.endpoint_tail(),
                    status = push_error.status(),
                    %push_error,
                    "delivery failed"
                ),
            }
        }

        // 7. Record the event once per type-per-day, only when something
        //    actually went out, and persist the ledger once.
        if delivered > 0 {
            log.append(entry);
            let encoded = serde_json::to_value(&log)?;
            if let Err(store_error) = self
                .store
                .write(documents::NOTIFICATION_LOG, encoded, log_document.version.as_ref())
                .await
            {
                // At-least-once semantics: the sends happened, the only
                // risk is a duplicate on a future run.
                error!(%store_error, "failed to persist notification log");
            }
        }

        info!(
            day = %today,
            %notification_type,
            attempted,
            delivered,
            "run complete"
        );

        Ok(RunReport {
            notification_type: Some(notification_type),
            attempted,
            delivered,
            deduplicated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockTextGenerator;
    use crate::adapters::push::MockPushSender;
    use crate::adapters::store::InMemoryDocumentStore;
    use chrono::TimeZone;
    use serde_json::json;

    /// 12:00 UTC on 2025-02-26, which is still 2025-02-26 at +09:00.
    fn period_start_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 26, 12, 0, 0).unwrap()
    }

    fn cycles_json() -> serde_json::Value {
        json!([
            { "startDate": "2025-01-01" },
            { "startDate": "2025-01-29" }
        ])
    }

    fn subscribers_json() -> serde_json::Value {
        json!([
            {
                "endpoint": "https://push.example/one",
                "keys": { "p256dh": "k", "auth": "k" }
            },
            {
                "endpoint": "https://push.example/two",
                "keys": { "p256dh": "k", "auth": "k" }
            },
            {
                "endpoint": "https://push.example/off",
                "keys": { "p256dh": "k", "auth": "k" },
                "settings": { "enabled": false }
            }
        ])
    }

    fn dispatcher(
        store: Arc<InMemoryDocumentStore>,
        push: Arc<MockPushSender>,
    ) -> NotificationDispatcher {
        let generator = PersonaTextGenerator::new(Arc::new(
            MockTextGenerator::new()
                .with_reply(r#"{"title": "Luna", "body": "Period starts today 🌷"}"#),
        ));
        NotificationDispatcher::new(store, push, generator)
    }

    #[tokio::test]
    async fn quiet_day_sends_nothing() {
        let store = Arc::new(
            InMemoryDocumentStore::new().with_document(documents::CYCLES, cycles_json()),
        );
        let push = Arc::new(MockPushSender::new());
        let dispatcher = dispatcher(store, push.clone());

        // 2025-02-01 matches no rule.
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let report = dispatcher.run(now).await.unwrap();

        assert_eq!(report, RunReport::quiet());
        assert_eq!(push.delivery_count(), 0);
    }

    #[tokio::test]
    async fn empty_history_is_a_successful_noop() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let push = Arc::new(MockPushSender::new());
        let dispatcher = dispatcher(store, push.clone());

        let report = dispatcher.run(period_start_instant()).await.unwrap();
        assert_eq!(report.notification_type, None);
        assert_eq!(push.delivery_count(), 0);
    }

    #[tokio::test]
    async fn delivers_to_enabled_subscribers_and_records_once() {
        let store = Arc::new(
            InMemoryDocumentStore::new()
                .with_document(documents::CYCLES, cycles_json())
                .with_document(documents::SUBSCRIBERS, subscribers_json()),
        );
        let push = Arc::new(MockPushSender::new());
        let dispatcher = dispatcher(store.clone(), push.clone());

        let report = dispatcher.run(period_start_instant()).await.unwrap();

        assert_eq!(report.notification_type, Some(NotificationType::PeriodStart));
        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 2);
        assert!(!report.deduplicated);

        // Exactly one ledger entry, regardless of fan-out.
        let log = store.value_of(documents::NOTIFICATION_LOG).unwrap();
        let entries = log.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["type"], "period-start");
        assert_eq!(entries[0]["id"], "2025-02-26-period-start");
    }

    #[tokio::test]
    async fn one_failing_subscriber_does_not_block_the_other() {
        let store = Arc::new(
            InMemoryDocumentStore::new()
                .with_document(documents::CYCLES, cycles_json())
                .with_document(documents::SUBSCRIBERS, subscribers_json()),
        );
        let push = Arc::new(MockPushSender::new().with_failure("https://push.example/one", 500));
        let dispatcher = dispatcher(store.clone(), push.clone());

        let report = dispatcher.run(period_start_instant()).await.unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        // One success is enough to commit the ledger.
        assert!(store.value_of(documents::NOTIFICATION_LOG).is_some());
    }

    #[tokio::test]
    async fn all_failures_leave_the_ledger_unwritten() {
        let store = Arc::new(
            InMemoryDocumentStore::new()
                .with_document(documents::CYCLES, cycles_json())
                .with_document(documents::SUBSCRIBERS, subscribers_json()),
        );
        let push = Arc::new(
            MockPushSender::new()
                .with_failure("https://push.example/one", 500)
                .with_gone("https://push.example/two"),
        );
        let dispatcher = dispatcher(store.clone(), push.clone());

        let report = dispatcher.run(period_start_instant()).await.unwrap();

        assert_eq!(report.delivered, 0);
        assert!(store.value_of(documents::NOTIFICATION_LOG).is_none());
    }

    #[tokio::test]
    async fn ledger_persist_failure_keeps_the_deliveries() {
        let store = Arc::new(
            InMemoryDocumentStore::new()
                .with_document(documents::CYCLES, cycles_json())
                .with_document(documents::SUBSCRIBERS, subscribers_json())
                .with_write_failure(documents::NOTIFICATION_LOG),
        );
        let push = Arc::new(MockPushSender::new());
        let dispatcher = dispatcher(store.clone(), push.clone());

        // The sends already happened, so the run still succeeds and reports
        // them; the unwritten ledger only risks a duplicate next run.
        let report = dispatcher.run(period_start_instant()).await.unwrap();

        assert_eq!(report.notification_type, Some(NotificationType::PeriodStart));
        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 2);
        assert!(!report.deduplicated);
        assert_eq!(push.delivery_count(), 2);
        assert!(store.value_of(documents::NOTIFICATION_LOG).is_none());
    }

    #[tokio::test]
    async fn second_run_same_day_is_deduplicated() {
        let store = Arc::new(
            InMemoryDocumentStore::new()
                .with_document(documents::CYCLES, cycles_json())
                .with_document(documents::SUBSCRIBERS, subscribers_json()),
        );
        let push = Arc::new(MockPushSender::new());
        let dispatcher = dispatcher(store.clone(), push.clone());

        let first = dispatcher.run(period_start_instant()).await.unwrap();
        assert_eq!(first.delivered, 2);

        // Scheduler restarts two hours later.
        let retry = period_start_instant() + chrono::Duration::hours(2);
        let second = dispatcher.run(retry).await.unwrap();

        assert!(second.deduplicated);
        assert_eq!(second.delivered, 0);
        assert_eq!(push.delivery_count(), 2);
    }

    #[tokio::test]
    async fn malformed_documents_decode_to_defaults() {
        let store = Arc::new(
            InMemoryDocumentStore::new()
                .with_document(documents::CYCLES, json!({ "oops": true }))
                .with_document(documents::SUBSCRIBERS, json!("nonsense")),
        );
        let push = Arc::new(MockPushSender::new());
        let dispatcher = dispatcher(store, push.clone());

        // Malformed history decodes to empty, so the run is a quiet noop.
        let report = dispatcher.run(period_start_instant()).await.unwrap();
        assert_eq!(report, RunReport::quiet());
    }
}
