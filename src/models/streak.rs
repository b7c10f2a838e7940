//! Streak metrics derived from a user's activity history.
//!
//! The computation is pure: it takes the raw activity timestamps, buckets
//! them to UTC calendar days, and walks the distinct days once. It is safe
//! to recompute on every request and needs no locking.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::utc_day;

/// Derived streak metrics for one user.
///
/// Invariant: `current_streak <= longest_streak <= total_completed_days`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakReport {
    /// Consecutive-day run ending at the most recent completed day
    pub current_streak: u32,
    /// Longest consecutive-day run anywhere in the history
    pub longest_streak: u32,
    /// Distinct calendar days with at least one activity
    pub total_completed_days: u32,
    /// Day-gaps strictly between the first and last completed day.
    /// This is what recovery pricing is based on (1 coin per day).
    pub missing_days: u32,
}

impl StreakReport {
    /// Compute streak metrics from raw activity timestamps.
    ///
    /// Order does not matter and several activities on the same UTC day
    /// count as one completed day.
    pub fn from_dates(dates: &[DateTime<Utc>]) -> Self {
        let days: BTreeSet<NaiveDate> = dates.iter().map(|d| utc_day(*d)).collect();
        Self::from_days(&days)
    }

    /// Compute streak metrics from already-bucketed day keys.
    pub fn from_days(days: &BTreeSet<NaiveDate>) -> Self {
        let total_completed_days = days.len() as u32;
        if total_completed_days == 0 {
            return Self::default();
        }

        let mut streak = 0u32;
        let mut longest = 0u32;
        let mut prev: Option<NaiveDate> = None;

        for &day in days {
            streak = match prev {
                Some(p) if p.checked_add_days(Days::new(1)) == Some(day) => streak + 1,
                _ => 1,
            };
            longest = longest.max(streak);
            prev = Some(day);
        }

        // Calendar gaps between first and last completed day. The span of
        // N consecutive days contains N-1 steps; anything beyond that is a
        // day with no activity.
        let first = *days.iter().next().unwrap();
        let last = *days.iter().next_back().unwrap();
        let span = last.signed_duration_since(first).num_days();
        let missing_days = (span - i64::from(total_completed_days - 1)).max(0) as u32;

        Self {
            current_streak: streak,
            longest_streak: longest,
            total_completed_days,
            missing_days,
        }
    }
}
