// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration and login routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::{Gender, Role, User};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: u32,
    pub gender: Gender,
    pub profile_image: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub user_id: String,
}

/// Register a new account. Coins start at zero, role at `user`.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    if body.name.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.is_empty()
        || body.profile_image.is_empty()
    {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }
    if body.age == 0 {
        return Err(AppError::BadRequest("Age must be greater than zero".to_string()));
    }

    let email = body.email.trim().to_lowercase();

    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(format!("User {} already exists", email)));
    }

    let password_hash = bcrypt::hash(&body.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        email,
        password_hash,
        age: body.age,
        gender: body.gender,
        profile_image: body.profile_image,
        coins: 0,
        is_banned: false,
        role: Role::User,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id: user.id }),
    ))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub coins: u32,
    pub profile_image: String,
}

/// Log in with email and password; issues a 7-day session token.
///
/// The token is returned in the body for API clients and also set as an
/// HttpOnly cookie for the browser frontend.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let user = state
        .db
        .get_user_by_email(body.email.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.is_banned {
        return Err(AppError::Forbidden("Account is banned".to_string()));
    }

    let valid = bcrypt::verify(&body.password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification failed: {}", e)))?;
    if !valid {
        // Same response for unknown email and wrong password
        return Err(AppError::Unauthorized);
    }

    let token = create_jwt(&user.id, user.role, &state.config.jwt_signing_key)
        .map_err(AppError::Internal)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(!state.config.frontend_url.starts_with("http://localhost"))
        .same_site(SameSite::Lax)
        .build();

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user: LoginUser {
                id: user.id,
                name: user.name,
                email: user.email,
                coins: user.coins,
                profile_image: user.profile_image,
            },
        }),
    ))
}

// ─── Logout ──────────────────────────────────────────────────

/// Clear the session cookie. The removal attributes must match the ones
/// used at login or browsers will keep the stale cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(!state.config.frontend_url.starts_with("http://localhost"))
        .same_site(SameSite::Lax)
        .build();

    (jar.remove(cookie), StatusCode::NO_CONTENT)
}
