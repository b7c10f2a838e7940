// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exercise type assigned to entries synthesized by streak recovery.
pub const RECOVERED_DAY: &str = "Recovered Day";

/// Unit attached to an activity's duration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minutes,
    Hours,
    /// Unit-less count (reps, laps); also used for recovered entries
    Number,
}

impl DurationUnit {
    /// Wire/display form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Minutes => "minutes",
            DurationUnit::Hours => "hours",
            DurationUnit::Number => "number",
        }
    }
}

/// How an activity entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySource {
    /// Submitted by the user
    Logged,
    /// Synthesized by a coin-funded recovery
    Recovered,
}

impl ActivitySource {
    /// Wire/display form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ActivitySource::Logged => "logged",
            ActivitySource::Recovered => "recovered",
        }
    }
}

/// Stored activity record in Firestore.
///
/// Records are append-only: created by the submit endpoint or synthesized
/// by recovery, never mutated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Document ID (UUID v4)
    pub id: String,
    /// Owning user's document ID
    pub user_id: String,
    /// Free-form exercise label ("Running", "Yoga", ...)
    pub exercise_type: String,
    /// Positive for logged activities; 0 for recovered entries
    pub duration: f64,
    pub duration_unit: DurationUnit,
    #[serde(default)]
    pub calories_burned: f64,
    /// Optional photo URL (pre-uploaded by the client)
    pub image_url: Option<String>,
    /// When the activity occurred
    pub date: DateTime<Utc>,
    pub source: ActivitySource,
    /// When this record was written (ISO 8601)
    pub created_at: String,
}

impl Activity {
    /// Build the synthetic entry recovery writes for one missed day.
    pub fn recovered(user_id: &str, date: DateTime<Utc>, now: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exercise_type: RECOVERED_DAY.to_string(),
            duration: 0.0,
            duration_unit: DurationUnit::Number,
            calories_burned: 0.0,
            image_url: None,
            date,
            source: ActivitySource::Recovered,
            created_at: now.to_string(),
        }
    }
}
