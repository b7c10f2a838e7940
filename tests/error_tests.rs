// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error taxonomy and HTTP mapping tests.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fitstreak::error::AppError;

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn test_status_mapping() {
    assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
    assert_eq!(
        status_of(AppError::Forbidden("banned".into())),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_of(AppError::NotFound("user".into())),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(AppError::BadRequest("bad".into())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::Conflict("dup".into())),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(AppError::InsufficientCoins {
            balance: 2,
            required: 5
        }),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::Database("boom".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_insufficient_coins_body_includes_balance() {
    let response = AppError::InsufficientCoins {
        balance: 2,
        required: 5,
    }
    .into_response();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "insufficient_coins");
    assert_eq!(body["coins"], 2);
}

#[tokio::test]
async fn test_database_error_body_is_generic() {
    let response = AppError::Database("connection string with secrets".into()).into_response();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[test]
fn test_recoverable_classification() {
    assert!(AppError::BadRequest("bad".into()).is_recoverable());
    assert!(AppError::InsufficientCoins {
        balance: 0,
        required: 1
    }
    .is_recoverable());
    assert!(!AppError::Database("boom".into()).is_recoverable());
}
