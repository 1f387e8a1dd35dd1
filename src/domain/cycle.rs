//! Cycle history records and derived cycle statistics.
//!
//! `CycleStats` is a pure derivation over the recorded cycle start dates:
//! given any snapshot of history it always produces the same prediction,
//! which is what makes the daily classification testable.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Average cycle length assumed when history holds fewer than two records.
pub const DEFAULT_CYCLE_DAYS: i64 = 28;

/// Shortest average the calculator will accept; anything lower is noise
/// from closely spaced or duplicate entries.
pub const MIN_CYCLE_DAYS: i64 = 21;

/// Days from ovulation back to the next predicted period start.
const LUTEAL_PHASE_DAYS: i64 = 14;

/// Length of the fertile window leading up to ovulation day.
const FERTILE_WINDOW_DAYS: i64 = 5;

/// A single recorded cycle, identified by its start date.
///
/// Records are owned by the record store; the scheduler only ever reads a
/// snapshot per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    /// First day of the cycle.
    pub start_date: NaiveDate,
}

impl CycleRecord {
    /// Creates a record for the given start date.
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }
}

/// Derived cycle statistics. Never persisted; recomputed each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Most recent recorded cycle start.
    pub last_start: NaiveDate,
    /// Predicted start of the next period (`last_start + average`).
    pub next_period_date: NaiveDate,
    /// Rounded mean of consecutive-start deltas, in whole days.
    pub average_length_days: i64,
    /// Predicted ovulation day (`next_period_date - 14`).
    pub ovulation_date: NaiveDate,
    /// First day of the fertile window (`ovulation_date - 5`).
    pub fertile_start: NaiveDate,
    /// Last day of the fertile window; equals `ovulation_date`.
    pub fertile_end: NaiveDate,
}

impl CycleStats {
    /// Derives statistics from a snapshot of cycle history.
    ///
    /// Input order is irrelevant; the history is sorted internally by start
    /// date. Returns `None` when the history is empty. With a single record
    /// there are no deltas to average, so [`DEFAULT_CYCLE_DAYS`] is used.
    pub fn from_history(records: &[CycleRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let mut starts: Vec<NaiveDate> = records.iter().map(|r| r.start_date).collect();
        starts.sort_unstable();

        let average_length_days = average_delta_days(&starts)
            .unwrap_or(DEFAULT_CYCLE_DAYS)
            .max(MIN_CYCLE_DAYS);

        let last_start = *starts.last().expect("history checked non-empty");
        let next_period_date = last_start + Duration::days(average_length_days);
        let ovulation_date = next_period_date - Duration::days(LUTEAL_PHASE_DAYS);
        let fertile_start = ovulation_date - Duration::days(FERTILE_WINDOW_DAYS);

        Some(Self {
            last_start,
            next_period_date,
            average_length_days,
            ovulation_date,
            fertile_start,
            fertile_end: ovulation_date,
        })
    }

    /// Whole days from `today` until the predicted period start.
    ///
    /// Negative once the prediction is in the past.
    pub fn days_until_period(&self, today: NaiveDate) -> i64 {
        (self.next_period_date - today).num_days()
    }

    /// Whole days from `today` until the predicted ovulation day.
    pub fn days_until_ovulation(&self, today: NaiveDate) -> i64 {
        (self.ovulation_date - today).num_days()
    }
}

/// Rounded mean of the deltas between consecutive sorted starts.
///
/// `None` when fewer than two starts exist.
fn average_delta_days(sorted_starts: &[NaiveDate]) -> Option<i64> {
    if sorted_starts.len() < 2 {
        return None;
    }

    let total: i64 = sorted_starts
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .sum();
    let count = (sorted_starts.len() - 1) as f64;

    Some((total as f64 / count).round() as i64)
}
