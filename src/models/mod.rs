// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod badge;
pub mod streak;
pub mod user;

pub use activity::{Activity, ActivitySource, DurationUnit, RECOVERED_DAY};
pub use badge::Badge;
pub use streak::StreakReport;
pub use user::{Gender, Role, User};
