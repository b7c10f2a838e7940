// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak recovery: spend coins to backfill missed days.
//!
//! Handles the core workflow:
//! 1. Validate the request (positive day count, user exists, not banned)
//! 2. Anchor on the most recent activity date (or now, for empty logs)
//! 3. Synthesize one "Recovered Day" entry per day behind the anchor
//! 4. Debit coins and persist all entries in a single Firestore transaction
//!
//! The debit and the record writes commit or fail together; a recovery can
//! never spend coins without producing records, or vice versa.

use chrono::{DateTime, Days, Utc};

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::Activity;

/// Exchange rate: one coin buys back one missed day.
pub const COINS_PER_RECOVERED_DAY: u32 = 1;

/// Outcome of a successful recovery.
#[derive(Debug)]
pub struct RecoveryOutcome {
    /// Coin balance after the debit
    pub balance: u32,
    /// The synthesized activity entries, newest first
    pub records: Vec<Activity>,
}

/// Dates for `n` recovered entries: the `n` days strictly before the
/// anchor, walking backward. The anchor day itself is never produced, so
/// recovered entries cannot collide with the activity they anchor on.
pub fn recovery_dates(anchor: DateTime<Utc>, n: u32) -> Vec<DateTime<Utc>> {
    (1..=u64::from(n))
        .filter_map(|i| anchor.checked_sub_days(Days::new(i)))
        .collect()
}

/// Recover `days_to_recover` missed days for a user, debiting one coin per
/// day. All preconditions are checked before any mutation.
pub async fn recover_days(
    db: &FirestoreDb,
    user_id: &str,
    days_to_recover: u32,
) -> Result<RecoveryOutcome> {
    if days_to_recover == 0 {
        return Err(AppError::BadRequest(
            "daysToRecover must be greater than zero".to_string(),
        ));
    }

    let user = db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    if user.is_banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    // Anchor on the most recent activity so recovered days extend the
    // existing history backward rather than inventing future days.
    let anchor = match db.get_last_activity(user_id).await? {
        Some(activity) => activity.date,
        None => Utc::now(),
    };

    let now = crate::time_utils::format_utc_rfc3339(Utc::now());
    let records: Vec<Activity> = recovery_dates(anchor, days_to_recover)
        .into_iter()
        .map(|date| Activity::recovered(user_id, date, &now))
        .collect();

    let cost = days_to_recover * COINS_PER_RECOVERED_DAY;
    let balance = db.recover_days(user_id, cost, &records).await?;

    tracing::info!(
        user_id,
        days = days_to_recover,
        balance,
        "Recovered missed days"
    );

    Ok(RecoveryOutcome { balance, records })
}
