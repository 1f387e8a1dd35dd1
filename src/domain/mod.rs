//! Domain layer - pure cycle math, classification, message rules, ledger.
//!
//! Nothing in this module performs I/O; every function here is a
//! deterministic function of its inputs, which is what keeps the daily
//! decision testable without any external collaborator.

pub mod classifier;
pub mod cycle;
pub mod ledger;
pub mod message;
pub mod subscriber;

pub use classifier::{classify, Classification, NotificationType, FORECAST_HORIZON_DAYS};
pub use cycle::{CycleRecord, CycleStats, DEFAULT_CYCLE_DAYS, MIN_CYCLE_DAYS};
pub use ledger::{DayKey, LedgerEntry, NotificationLog, LEDGER_CAP, NOTIFICATION_TZ_HOURS};
pub use message::{
    fallback_for, normalize_body, validate_title, MessageError, PersonaMessage, BODY_CHAR_BUDGET,
};
pub use subscriber::{Subscriber, SubscriberSettings, SubscriptionKeys};
