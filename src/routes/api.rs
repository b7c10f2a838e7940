// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::db::ActivityQueryCursor;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, ActivitySource, Badge, DurationUnit, StreakReport, User};
use crate::services::{self, CoinAction};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/activities", get(get_activities).post(submit_activity))
        .route("/api/activities/recover", post(recover_days))
        .route("/api/coins", post(adjust_coins))
}

/// Load the user behind the principal and reject banned accounts.
///
/// Bans block every endpoint here uniformly, reads included.
async fn require_active_user(state: &AppState, auth: &AuthUser) -> Result<User> {
    let user = state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", auth.user_id)))?;

    if user.is_banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    Ok(user)
}

// ─── Activity Summaries ──────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitySummary {
    pub id: String,
    pub exercise_type: String,
    pub duration: f64,
    pub duration_unit: String,
    pub calories_burned: f64,
    pub image_url: Option<String>,
    pub date: String,
    pub source: String,
}

impl From<Activity> for ActivitySummary {
    fn from(a: Activity) -> Self {
        Self {
            id: a.id,
            exercise_type: a.exercise_type,
            duration: a.duration,
            duration_unit: a.duration_unit.as_str().to_string(),
            calories_burned: a.calories_burned,
            image_url: a.image_url,
            date: format_utc_rfc3339(a.date),
            source: a.source.as_str().to_string(),
        }
    }
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub activities: Vec<ActivitySummary>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed_days: u32,
    pub missing_days: u32,
    /// Cumulative badge labels, oldest threshold first
    pub badges: Vec<String>,
    pub total_calories: f64,
    pub coins: u32,
    /// Coins needed to recover every missing day (1 coin per day)
    pub coins_needed_to_recover: u32,
    pub can_recover: bool,
}

/// Get the user's dashboard: full history, streak metrics, badges, and
/// coin-recovery pricing.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>> {
    let user = require_active_user(&state, &auth).await?;

    let activities = state.db.get_all_activities(&user.id).await?;

    let dates: Vec<chrono::DateTime<chrono::Utc>> = activities.iter().map(|a| a.date).collect();
    let report = StreakReport::from_dates(&dates);
    let badges: Vec<String> = Badge::evaluate(&report)
        .iter()
        .map(ToString::to_string)
        .collect();
    let total_calories: f64 = activities.iter().map(|a| a.calories_burned).sum();

    let coins_needed_to_recover = report.missing_days * services::COINS_PER_RECOVERED_DAY;

    tracing::debug!(
        user_id = %user.id,
        current_streak = report.current_streak,
        total_days = report.total_completed_days,
        "Dashboard computed"
    );

    Ok(Json(DashboardResponse {
        activities: activities.into_iter().map(ActivitySummary::from).collect(),
        current_streak: report.current_streak,
        longest_streak: report.longest_streak,
        total_completed_days: report.total_completed_days,
        missing_days: report.missing_days,
        badges,
        total_calories,
        can_recover: coins_needed_to_recover > 0 && user.coins >= coins_needed_to_recover,
        coins_needed_to_recover,
        coins: user.coins,
    }))
}

// ─── Activity Listing ────────────────────────────────────────

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

const MAX_PER_PAGE: u32 = 100;
const CURSOR_PARTS: usize = 2;

fn parse_cursor(cursor: Option<&str>) -> Result<Option<ActivityQueryCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor = || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let parts: Vec<&str> = decoded_str.split(':').collect();
            if parts.len() != CURSOR_PARTS {
                return Err(invalid_cursor());
            }

            let seconds = parts[0].parse::<i64>().map_err(|_| invalid_cursor())?;
            let nanos = parts[1].parse::<u32>().map_err(|_| invalid_cursor())?;
            let date = chrono::DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid_cursor)?;

            Ok(ActivityQueryCursor { date })
        })
        .transpose()
}

fn encode_cursor(cursor: ActivityQueryCursor) -> String {
    let payload = format!(
        "{}:{}",
        cursor.date.timestamp(),
        cursor.date.timestamp_subsec_nanos()
    );
    URL_SAFE_NO_PAD.encode(payload)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivitySummary>,
    pub per_page: u32,
    pub next_cursor: Option<String>,
}

/// Get a page of the user's activities, newest first.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>> {
    let limit = params.per_page.min(MAX_PER_PAGE).max(1);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let user = require_active_user(&state, &auth).await?;

    // Fetch one extra item to determine if another page is available.
    let fetch_limit = limit.saturating_add(1);
    let mut results = state
        .db
        .get_activities_for_user(&user.id, cursor, fetch_limit)
        .await?;

    let has_more = results.len() > limit as usize;
    if has_more {
        results.truncate(limit as usize);
    }

    let next_cursor = if has_more {
        results
            .last()
            .map(|a| encode_cursor(ActivityQueryCursor { date: a.date }))
    } else {
        None
    };

    Ok(Json(ActivitiesResponse {
        activities: results.into_iter().map(ActivitySummary::from).collect(),
        per_page: limit,
        next_cursor,
    }))
}

// ─── Activity Submission ─────────────────────────────────────

#[derive(Deserialize)]
pub struct SubmitActivityRequest {
    pub exercise_type: String,
    pub duration: f64,
    pub duration_unit: DurationUnit,
    #[serde(default)]
    pub calories_burned: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    /// When the activity occurred; defaults to now
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubmitActivityResponse {
    pub activity: ActivitySummary,
    /// Cumulative badge labels after this activity
    pub badges: Vec<String>,
}

/// Log a new activity and report the badge set it results in.
async fn submit_activity(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SubmitActivityRequest>,
) -> Result<Json<SubmitActivityResponse>> {
    if body.exercise_type.trim().is_empty() {
        return Err(AppError::BadRequest(
            "exerciseType is required".to_string(),
        ));
    }
    if body.duration.is_nan() || body.duration <= 0.0 {
        return Err(AppError::BadRequest(
            "Duration must be greater than zero".to_string(),
        ));
    }
    if body.calories_burned.is_nan() || body.calories_burned < 0.0 {
        return Err(AppError::BadRequest(
            "Calories burned must not be negative".to_string(),
        ));
    }

    let date = match body.date.as_deref() {
        Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|_| {
                AppError::BadRequest("Invalid 'date': must be RFC3339 datetime".to_string())
            })?,
        None => chrono::Utc::now(),
    };

    let user = require_active_user(&state, &auth).await?;

    let activity = Activity {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        exercise_type: body.exercise_type.trim().to_string(),
        duration: body.duration,
        duration_unit: body.duration_unit,
        calories_burned: body.calories_burned,
        image_url: body.image_url,
        date,
        source: ActivitySource::Logged,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    state.db.insert_activity(&activity).await?;

    tracing::info!(
        user_id = %user.id,
        activity_id = %activity.id,
        exercise_type = %activity.exercise_type,
        "Activity logged"
    );

    // Re-derive the badge set from the full history including this entry.
    let dates: Vec<chrono::DateTime<chrono::Utc>> = state
        .db
        .get_all_activities(&user.id)
        .await?
        .iter()
        .map(|a| a.date)
        .collect();
    let badges: Vec<String> = Badge::evaluate(&StreakReport::from_dates(&dates))
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(Json(SubmitActivityResponse {
        activity: ActivitySummary::from(activity),
        badges,
    }))
}

// ─── Streak Recovery ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct RecoverRequest {
    pub days_to_recover: u32,
    /// Optional explicit target; must match the authenticated user
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecoverResponse {
    pub coins: u32,
    pub recovered_days: u32,
    pub recovered_activities: Vec<ActivitySummary>,
}

/// Spend coins to backfill missed days (1 coin per day).
async fn recover_days(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RecoverRequest>,
) -> Result<Json<RecoverResponse>> {
    if let Some(target) = body.user_id.as_deref() {
        if target != auth.user_id {
            return Err(AppError::Forbidden(
                "Cannot recover days for another user".to_string(),
            ));
        }
    }

    let outcome =
        services::recover_days(&state.db, &auth.user_id, body.days_to_recover).await?;

    Ok(Json(RecoverResponse {
        coins: outcome.balance,
        recovered_days: outcome.records.len() as u32,
        recovered_activities: outcome
            .records
            .into_iter()
            .map(ActivitySummary::from)
            .collect(),
    }))
}

// ─── Coin Adjustment ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct CoinRequest {
    pub action: CoinAction,
    pub amount: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CoinResponse {
    pub coins: u32,
}

/// Adjust the authenticated user's coin balance.
async fn adjust_coins(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CoinRequest>,
) -> Result<Json<CoinResponse>> {
    if body.amount == 0 {
        return Err(AppError::BadRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }

    let user = require_active_user(&state, &auth).await?;

    let coins = state
        .db
        .adjust_coins(&user.id, body.action, body.amount)
        .await?;

    Ok(Json(CoinResponse { coins }))
}
