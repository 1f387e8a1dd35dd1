//! Daily notification classification.
//!
//! A pure function of `(today, stats)` with no persisted state. The checks
//! form an explicit ordered rule list evaluated top to bottom; the order is
//! load-bearing because the forecast and fertile windows overlap around
//! ovulation and period start.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::cycle::CycleStats;

/// How many days ahead of a predicted period the forecast fires.
pub const FORECAST_HORIZON_DAYS: i64 = 5;

/// The kind of notification active for a given day.
///
/// At most one type is active per calendar day. The serialized names match
/// the persisted notification log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    /// Predicted period starts today.
    PeriodStart,
    /// Predicted period starts within the forecast horizon.
    PeriodForecast,
    /// Predicted ovulation day is today.
    OvulationDay,
    /// Today falls inside the fertile window, before ovulation day.
    FertileWindow,
}

impl NotificationType {
    /// Stable string form, used for ledger entry ids and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PeriodStart => "period-start",
            NotificationType::PeriodForecast => "period-forecast",
            NotificationType::OvulationDay => "ovulation-day",
            NotificationType::FertileWindow => "fertile-window",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The day's classification plus the context the message generator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The single active notification type.
    pub notification_type: NotificationType,
    /// Whole days until the predicted period start (0 on the day itself).
    pub days_until_period: i64,
    /// Whole days until the predicted ovulation day.
    pub days_until_ovulation: i64,
}

/// One classification rule. Rules see the full context and either claim the
/// day or pass.
type Rule = fn(NaiveDate, &CycleStats) -> Option<NotificationType>;

/// Precedence order: period start beats the forecast window that contains
/// it, ovulation day beats the fertile window that touches it.
const RULES: &[Rule] = &[
    period_start,
    period_forecast,
    ovulation_day,
    fertile_window,
];

fn period_start(today: NaiveDate, stats: &CycleStats) -> Option<NotificationType> {
    (stats.days_until_period(today) == 0).then_some(NotificationType::PeriodStart)
}

fn period_forecast(today: NaiveDate, stats: &CycleStats) -> Option<NotificationType> {
    let days = stats.days_until_period(today);
    (days > 0 && days <= FORECAST_HORIZON_DAYS).then_some(NotificationType::PeriodForecast)
}

fn ovulation_day(today: NaiveDate, stats: &CycleStats) -> Option<NotificationType> {
    (stats.days_until_ovulation(today) == 0).then_some(NotificationType::OvulationDay)
}

fn fertile_window(today: NaiveDate, stats: &CycleStats) -> Option<NotificationType> {
    // Half-open: ovulation day itself is claimed by the rule above.
    (stats.fertile_start <= today && today < stats.ovulation_date)
        .then_some(NotificationType::FertileWindow)
}

/// Classifies `today` against the derived stats.
///
/// First matching rule wins; `None` means no notification is due, which is
/// the normal outcome on most days and not an error.
pub fn classify(today: NaiveDate, stats: &CycleStats) -> Option<Classification> {
    let notification_type = RULES.iter().find_map(|rule| rule(today, stats))?;

    Some(Classification {
        notification_type,
        days_until_period: stats.days_until_period(today),
        days_until_ovulation: stats.days_until_ovulation(today),
    })
}
