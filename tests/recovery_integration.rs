// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end recovery tests against the Firestore emulator.
//!
//! Run with FIRESTORE_EMULATOR_HOST set; skipped otherwise.

use chrono::{DateTime, Utc};
use fitstreak::models::{Activity, ActivitySource, DurationUnit, Gender, Role, User, RECOVERED_DAY};
use fitstreak::services;
use fitstreak::services::ledger::CoinAction;
use fitstreak::time_utils::utc_day;

mod common;

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn test_user(coins: u32) -> User {
    let id = uuid::Uuid::new_v4().to_string();
    User {
        email: format!("{}@example.com", id),
        id: id.clone(),
        name: "Recovery Test".to_string(),
        password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
        age: 30,
        gender: Gender::Other,
        profile_image: "https://example.com/p.png".to_string(),
        coins,
        is_banned: false,
        role: Role::User,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

fn logged_activity(user_id: &str, date: DateTime<Utc>) -> Activity {
    Activity {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        exercise_type: "Running".to_string(),
        duration: 30.0,
        duration_unit: DurationUnit::Minutes,
        calories_burned: 250.0,
        image_url: None,
        date,
        source: ActivitySource::Logged,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[tokio::test]
async fn test_recovery_end_to_end() {
    require_emulator!();

    let db = common::test_db().await;
    let user = test_user(10);
    db.upsert_user(&user).await.expect("create user");

    let anchor = ts("2024-03-10T09:30:00Z");
    db.insert_activity(&logged_activity(&user.id, anchor))
        .await
        .expect("insert anchor activity");

    let outcome = services::recover_days(&db, &user.id, 3)
        .await
        .expect("recovery should succeed");

    assert_eq!(outcome.balance, 7);
    assert_eq!(outcome.records.len(), 3);

    let recovered_days: Vec<_> = outcome.records.iter().map(|r| utc_day(r.date)).collect();
    assert_eq!(
        recovered_days,
        vec![
            utc_day(ts("2024-03-09T00:00:00Z")),
            utc_day(ts("2024-03-08T00:00:00Z")),
            utc_day(ts("2024-03-07T00:00:00Z")),
        ]
    );
    for record in &outcome.records {
        assert_ne!(utc_day(record.date), utc_day(anchor));
        assert_eq!(record.exercise_type, RECOVERED_DAY);
    }

    // Debit persisted
    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.coins, 7);

    // Records persisted: anchor + 3 recovered
    let history = db.get_all_activities(&user.id).await.unwrap();
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn test_recovery_insufficient_coins_mutates_nothing() {
    require_emulator!();

    let db = common::test_db().await;
    let user = test_user(2);
    db.upsert_user(&user).await.expect("create user");

    let err = services::recover_days(&db, &user.id, 5)
        .await
        .expect_err("recovery should fail");

    assert!(matches!(
        err,
        fitstreak::error::AppError::InsufficientCoins {
            balance: 2,
            required: 5
        }
    ));

    let stored = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.coins, 2);
    assert!(db.get_all_activities(&user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recovery_banned_user_rejected() {
    require_emulator!();

    let db = common::test_db().await;
    let mut user = test_user(10);
    user.is_banned = true;
    db.upsert_user(&user).await.expect("create user");

    let err = services::recover_days(&db, &user.id, 1)
        .await
        .expect_err("banned user must be rejected");

    assert!(matches!(err, fitstreak::error::AppError::Forbidden(_)));
    assert_eq!(db.get_user(&user.id).await.unwrap().unwrap().coins, 10);
}

#[tokio::test]
async fn test_recovery_empty_history_anchors_on_today() {
    require_emulator!();

    let db = common::test_db().await;
    let user = test_user(3);
    db.upsert_user(&user).await.expect("create user");

    let outcome = services::recover_days(&db, &user.id, 2)
        .await
        .expect("recovery should succeed");

    let today = utc_day(chrono::Utc::now());
    for record in &outcome.records {
        assert!(utc_day(record.date) < today);
    }
    assert_eq!(outcome.balance, 1);
}

#[tokio::test]
async fn test_adjust_coins_lifecycle() {
    require_emulator!();

    let db = common::test_db().await;
    let user = test_user(0);
    db.upsert_user(&user).await.expect("create user");

    // Credit
    assert_eq!(
        db.adjust_coins(&user.id, CoinAction::Add, 8).await.unwrap(),
        8
    );

    // Checked debit
    assert_eq!(
        db.adjust_coins(&user.id, CoinAction::Spend, 3)
            .await
            .unwrap(),
        5
    );

    // Checked debit beyond balance fails and leaves the balance alone
    let err = db
        .adjust_coins(&user.id, CoinAction::Spend, 10)
        .await
        .expect_err("overspend must fail");
    assert!(matches!(
        err,
        fitstreak::error::AppError::InsufficientCoins {
            balance: 5,
            required: 10
        }
    ));
    assert_eq!(db.get_user(&user.id).await.unwrap().unwrap().coins, 5);

    // Floor debit truncates at zero
    assert_eq!(
        db.adjust_coins(&user.id, CoinAction::Remove, 10)
            .await
            .unwrap(),
        0
    );
}
