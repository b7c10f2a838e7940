// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar-day bucketing.
//!
//! All day-granularity logic in the crate goes through [`utc_day`] so that
//! streaks, gaps, and recovery windows agree on a single reference timezone
//! (UTC). Two timestamps map to the same day key iff they fall on the same
//! UTC calendar day.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Bucket a timestamp to its UTC calendar-day key.
pub fn utc_day(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}
