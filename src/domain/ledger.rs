//! Append-only notification ledger used for deduplication.
//!
//! The ledger is the sole source of truth for "did we already notify
//! today". Day boundaries are computed in one fixed business time zone so
//! the decision does not move with the scheduler host's clock settings.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::NotificationType;
use super::message::PersonaMessage;

/// Entries kept in the persisted log. Older entries fall off the tail.
pub const LEDGER_CAP: usize = 50;

/// Offset of the notification time zone from UTC, in hours.
///
/// A business constant, deliberately not a user or deployment setting: the
/// dedup boundary must be identical no matter where the scheduler runs.
pub const NOTIFICATION_TZ_HOURS: i32 = 9;

fn notification_tz() -> FixedOffset {
    FixedOffset::east_opt(NOTIFICATION_TZ_HOURS * 3600).expect("offset within +/-24h")
}

/// A calendar day in the notification time zone.
///
/// Derived from an instant by converting into the fixed zone and truncating
/// to midnight; two instants on the same wall-clock day there share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Derives the day key for an instant.
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&notification_tz()).date_naive())
    }

    /// The underlying calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// One sent notification. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Deterministic id: day key plus type, e.g. `2025-02-26-period-start`.
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Builds the entry for a message sent at `sent_at`.
    pub fn new(
        notification_type: NotificationType,
        message: &PersonaMessage,
        sent_at: DateTime<Utc>,
    ) -> Self {
        let day = DayKey::from_instant(sent_at);
        Self {
            id: format!("{day}-{notification_type}"),
            notification_type,
            title: message.title.clone(),
            body: message.body.clone(),
            sent_at,
        }
    }

    /// The notification day this entry belongs to.
    pub fn day_key(&self) -> DayKey {
        DayKey::from_instant(self.sent_at)
    }
}

/// In-memory view of the persisted log, newest entry first.
///
/// Loaded once per run, mutated in memory, persisted at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationLog {
    entries: Vec<LedgerEntry>,
}

impl NotificationLog {
    /// An empty log, the substitute for a missing or malformed document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when an entry for this day and type already exists.
    ///
    /// Linear scan; the log is capped so this stays cheap.
    pub fn was_already_sent(&self, day: DayKey, notification_type: NotificationType) -> bool {
        self.entries
            .iter()
            .any(|e| e.notification_type == notification_type && e.day_key() == day)
    }

    /// Prepends an entry and truncates the log to [`LEDGER_CAP`].
    pub fn append(&mut self, entry: LedgerEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(LEDGER_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message() -> PersonaMessage {
        PersonaMessage::new("Luna", "test body 🌸").unwrap()
    }

    fn instant(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn day_key_uses_notification_zone_not_utc() {
        // 16:00 UTC is already the next day at +09:00.
        let key = DayKey::from_instant(instant(2025, 2, 25, 16));
        assert_eq!(key.to_string(), "2025-02-26");

        // 14:00 UTC is still the same day.
        let key = DayKey::from_instant(instant(2025, 2, 25, 14));
        assert_eq!(key.to_string(), "2025-02-25");
    }

    #[test]
    fn entry_id_is_day_plus_type() {
        let entry = LedgerEntry::new(
            NotificationType::PeriodStart,
            &message(),
            instant(2025, 2, 26, 0),
        );
        assert_eq!(entry.id, "2025-02-26-period-start");
    }

    #[test]
    fn same_day_same_type_is_deduplicated() {
        let mut log = NotificationLog::empty();
        let sent = instant(2025, 2, 26, 0);
        log.append(LedgerEntry::new(NotificationType::PeriodStart, &message(), sent));

        let same_day = DayKey::from_instant(instant(2025, 2, 26, 5));
        assert!(log.was_already_sent(same_day, NotificationType::PeriodStart));
        assert!(!log.was_already_sent(same_day, NotificationType::OvulationDay));
    }

    #[test]
    fn dedup_resets_at_the_day_boundary() {
        let mut log = NotificationLog::empty();
        log.append(LedgerEntry::new(
            NotificationType::PeriodForecast,
            &message(),
            instant(2025, 2, 25, 0),
        ));

        let next_day = DayKey::from_instant(instant(2025, 2, 26, 0));
        assert!(!log.was_already_sent(next_day, NotificationType::PeriodForecast));
    }

    #[test]
    fn boundary_follows_the_fixed_zone() {
        // Sent at 16:30 UTC on the 25th, which is the 26th at +09:00. A
        // rerun later that UTC evening must still count as the same day.
        let mut log = NotificationLog::empty();
        log.append(LedgerEntry::new(
            NotificationType::PeriodStart,
            &message(),
            Utc.with_ymd_and_hms(2025, 2, 25, 16, 30, 0).unwrap(),
        ));

        let rerun = DayKey::from_instant(instant(2025, 2, 25, 20));
        assert!(log.was_already_sent(rerun, NotificationType::PeriodStart));

        // After the next +09:00 midnight (15:00 UTC on the 26th) it is a
        // fresh day again.
        let after_boundary = DayKey::from_instant(instant(2025, 2, 26, 16));
        assert!(!log.was_already_sent(after_boundary, NotificationType::PeriodStart));
    }

    #[test]
    fn log_is_capped_and_newest_first() {
        let mut log = NotificationLog::empty();
        for i in 0..(LEDGER_CAP as u32 + 10) {
            let sent = instant(2024, 1, 1, 0) + chrono::Duration::days(i64::from(i));
            log.append(LedgerEntry::new(NotificationType::FertileWindow, &message(), sent));
        }

        assert_eq!(log.len(), LEDGER_CAP);
        // Newest entry sits at the front.
        let first = &log.entries()[0];
        let second = &log.entries()[1];
        assert!(first.sent_at > second.sent_at);
    }

    #[test]
    fn log_round_trips_as_plain_json_array() {
        let mut log = NotificationLog::empty();
        log.append(LedgerEntry::new(
            NotificationType::OvulationDay,
            &message(),
            instant(2025, 2, 12, 0),
        ));

        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        let back: NotificationLog = serde_json::from_value(json).unwrap();
        assert_eq!(back, log);
    }
}
