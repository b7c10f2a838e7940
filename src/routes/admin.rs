// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes: user inspection, coin grants, and bans.
//!
//! All routes here are layered behind both `require_auth` and
//! `require_admin` (see routes/mod.rs); handlers can assume an admin
//! principal.

use crate::error::{AppError, Result};
use crate::models::{Activity, User};
use crate::services::CoinAction;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DAILY_ACTIVITY_WINDOW_DAYS: u64 = 30;
const MONTHLY_REGISTRATION_WINDOW_MONTHS: u32 = 12;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/users", get(get_users))
        .route("/api/admin/coins", post(adjust_coins))
        .route("/api/admin/users/ban", patch(set_ban))
}

// ─── User Listing & Aggregates ───────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminUserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: u32,
    pub gender: String,
    pub coins: u32,
    pub is_banned: bool,
    pub role: String,
    pub created_at: String,
}

impl From<User> for AdminUserSummary {
    // Deliberately drops password_hash
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            age: u.age,
            gender: u.gender.as_str().to_string(),
            coins: u.coins,
            is_banned: u.is_banned,
            role: u.role.as_str().to_string(),
            created_at: u.created_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUserSummary>,
    /// Activity count per day ("YYYY-MM-DD"), last 30 days, sorted ascending
    pub daily_activity: BTreeMap<String, u32>,
    /// Registration count per month ("YYYY-MM"), last 12 months, sorted ascending
    pub monthly_registrations: BTreeMap<String, u32>,
}

/// List all users plus activity/registration aggregates for the admin
/// dashboard charts.
async fn get_users(State(state): State<Arc<AppState>>) -> Result<Json<AdminUsersResponse>> {
    let now = Utc::now();

    let users = state.db.list_users().await?;

    let activity_cutoff = now
        .checked_sub_days(Days::new(DAILY_ACTIVITY_WINDOW_DAYS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Date arithmetic overflow")))?;
    let recent_activities = state.db.get_activities_since(activity_cutoff).await?;

    let registration_cutoff = now
        .checked_sub_months(Months::new(MONTHLY_REGISTRATION_WINDOW_MONTHS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Date arithmetic overflow")))?;

    let daily_activity = group_activities_by_day(&recent_activities);
    let monthly_registrations = group_registrations_by_month(&users, &registration_cutoff);

    tracing::debug!(
        users = users.len(),
        recent_activities = recent_activities.len(),
        "Admin aggregates computed"
    );

    Ok(Json(AdminUsersResponse {
        users: users.into_iter().map(AdminUserSummary::from).collect(),
        daily_activity,
        monthly_registrations,
    }))
}

/// Count activities per UTC calendar day.
fn group_activities_by_day(activities: &[Activity]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for activity in activities {
        let key = crate::time_utils::utc_day(activity.date).to_string();
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Count registrations per month ("YYYY-MM") at or after the cutoff.
///
/// `created_at` is stored as RFC3339, so the month key is a string prefix.
fn group_registrations_by_month(users: &[User], cutoff: &DateTime<Utc>) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for user in users {
        let Ok(created) = DateTime::parse_from_rfc3339(&user.created_at) else {
            continue;
        };
        if created.with_timezone(&Utc) < *cutoff {
            continue;
        }
        if user.created_at.len() >= 7 {
            *counts.entry(user.created_at[..7].to_string()).or_insert(0) += 1;
        }
    }
    counts
}

// ─── Coin Grants ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AdminCoinRequest {
    /// `add` or `remove`; `spend` is a user-facing action only
    pub action: CoinAction,
    pub amount: u32,
    /// If absent, apply to all users
    #[serde(default)]
    pub target_user_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AdminCoinResponse {
    /// New balance when a single user was targeted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<u32>,
    /// Number of users updated
    pub updated: usize,
}

/// Credit or floor-debit coins for one user or every user.
async fn adjust_coins(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdminCoinRequest>,
) -> Result<Json<AdminCoinResponse>> {
    if body.action == CoinAction::Spend {
        return Err(AppError::BadRequest(
            "Admin adjustments must use add or remove".to_string(),
        ));
    }
    if body.amount == 0 {
        return Err(AppError::BadRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }

    match body.target_user_id.as_deref() {
        Some(user_id) => {
            let coins = state.db.adjust_coins(user_id, body.action, body.amount).await?;
            Ok(Json(AdminCoinResponse {
                coins: Some(coins),
                updated: 1,
            }))
        }
        None => {
            let updated = state.db.adjust_coins_all(body.action, body.amount).await?;
            tracing::info!(action = ?body.action, amount = body.amount, updated, "Coins adjusted for all users");
            Ok(Json(AdminCoinResponse {
                coins: None,
                updated,
            }))
        }
    }
}

// ─── Bans ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BanRequest {
    pub target_user_id: String,
    pub ban: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BanResponse {
    pub user_id: String,
    pub banned: bool,
}

/// Ban or unban a user.
async fn set_ban(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BanRequest>,
) -> Result<Json<BanResponse>> {
    let mut user = state
        .db
        .get_user(&body.target_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", body.target_user_id)))?;

    user.is_banned = body.ban;
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, banned = body.ban, "Ban state changed");

    Ok(Json(BanResponse {
        user_id: user.id,
        banned: body.ban,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivitySource, DurationUnit, Gender, Role};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn activity(date: &str) -> Activity {
        Activity {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "user-1".to_string(),
            exercise_type: "Running".to_string(),
            duration: 30.0,
            duration_unit: DurationUnit::Minutes,
            calories_burned: 200.0,
            image_url: None,
            date: ts(date),
            source: ActivitySource::Logged,
            created_at: date.to_string(),
        }
    }

    fn user(created_at: &str) -> User {
        User {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Test".to_string(),
            email: format!("{}@example.com", uuid::Uuid::new_v4()),
            password_hash: String::new(),
            age: 30,
            gender: Gender::Other,
            profile_image: String::new(),
            coins: 0,
            is_banned: false,
            role: Role::User,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_group_activities_by_day() {
        let activities = vec![
            activity("2024-03-10T08:00:00Z"),
            activity("2024-03-10T19:00:00Z"),
            activity("2024-03-11T07:00:00Z"),
        ];

        let counts = group_activities_by_day(&activities);

        assert_eq!(counts.get("2024-03-10"), Some(&2));
        assert_eq!(counts.get("2024-03-11"), Some(&1));
    }

    #[test]
    fn test_group_registrations_by_month() {
        let users = vec![
            user("2024-01-15T10:00:00Z"),
            user("2024-01-20T10:00:00Z"),
            user("2024-03-05T10:00:00Z"),
            user("2022-06-01T10:00:00Z"), // before cutoff
        ];
        let cutoff = ts("2023-06-01T00:00:00Z");

        let counts = group_registrations_by_month(&users, &cutoff);

        assert_eq!(counts.get("2024-01"), Some(&2));
        assert_eq!(counts.get("2024-03"), Some(&1));
        assert_eq!(counts.get("2022-06"), None);
    }

    #[test]
    fn test_group_registrations_skips_unparseable_dates() {
        let users = vec![user("not-a-date")];
        let cutoff = ts("2023-06-01T00:00:00Z");
        assert!(group_registrations_by_month(&users, &cutoff).is_empty());
    }
}
