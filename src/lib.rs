// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitStreak: log workouts, keep streaks alive, spend coins to recover
//! missed days.
//!
//! This crate provides the backend API: activity logging, streak and badge
//! computation, the coin ledger, and the admin surface.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
