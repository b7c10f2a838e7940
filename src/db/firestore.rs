// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, including the coin balance)
//! - Activities (logged and recovered entries)
//! - Atomic coin mutations (ledger adjustments, streak recovery)
//!
//! The coin balance lives on the user document, so every ledger mutation is
//! a single-document read-modify-write inside a Firestore transaction. If a
//! concurrent request touches the same user, Firestore retries or aborts
//! instead of committing a lost update — two racing recoveries can never
//! both spend the same coins.

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Activity, User};
use crate::services::ledger::{apply_coin_action, CoinAction};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Attempts per optimistic transaction before giving up on contention.
const TRANSACTION_ATTEMPTS: usize = 3;

/// Cursor for paging through a user's activities, newest first.
#[derive(Debug, Clone, Copy)]
pub struct ActivityQueryCursor {
    pub date: DateTime<Utc>,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // ExternalJwtFunctionSource provides a dummy token without needing a
        // custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user by email (unique); used by login and registration.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        let matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List all users (admin dashboard).
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Activity Operations ─────────────────────────────────────

    /// Store a new activity record.
    pub async fn insert_activity(&self, activity: &Activity) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a page of activities for a user, newest first.
    ///
    /// Pass the date of the last activity from the previous page as the
    /// cursor to fetch the next page.
    pub async fn get_activities_for_user(
        &self,
        user_id: &str,
        cursor: Option<ActivityQueryCursor>,
        limit: u32,
    ) -> Result<Vec<Activity>, AppError> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES);

        let query = if let Some(cursor) = cursor {
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").less_than(cursor.date),
                ])
            })
        } else {
            query.filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
        };

        query
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the most recent activity for a user, if any.
    pub async fn get_last_activity(&self, user_id: &str) -> Result<Option<Activity>, AppError> {
        Ok(self
            .get_activities_for_user(user_id, None, 1)
            .await?
            .into_iter()
            .next())
    }

    /// Get a user's complete activity history, newest first.
    ///
    /// Used by the dashboard, which needs every record for streaks and
    /// calorie totals. Per-user histories are small (one record per logged
    /// session), so this is a single unpaged query.
    pub async fn get_all_activities(&self, user_id: &str) -> Result<Vec<Activity>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all activities on or after a cutoff, across all users (admin
    /// aggregates).
    pub async fn get_activities_since(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Activity>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("date").greater_than_or_equal(cutoff)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Coin Mutations ───────────────────────────────────

    /// Atomically apply a ledger operation to a user's balance.
    ///
    /// The read and write happen inside a Firestore transaction, so two
    /// concurrent adjustments to the same user serialize instead of both
    /// applying against a stale balance. A commit that loses the race is
    /// retried against fresh data; business failures (unknown user,
    /// insufficient coins) are final and roll back without retrying.
    ///
    /// Returns the new balance.
    pub async fn adjust_coins(
        &self,
        user_id: &str,
        action: CoinAction,
        amount: u32,
    ) -> Result<u32, AppError> {
        let mut last_err = None;
        for attempt in 1..=TRANSACTION_ATTEMPTS {
            match self.try_adjust_coins(user_id, action, amount).await {
                Ok(balance) => {
                    tracing::info!(user_id, ?action, amount, balance, "Coins adjusted");
                    return Ok(balance);
                }
                Err(TxError::Fatal(e)) => return Err(e),
                Err(TxError::Contention(e)) => {
                    tracing::warn!(user_id, attempt, error = %e, "Coin transaction contention, retrying");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| AppError::Database("Transaction retries exhausted".to_string())))
    }

    async fn try_adjust_coins(
        &self,
        user_id: &str,
        action: CoinAction,
        amount: u32,
    ) -> Result<u32, TxError> {
        let client = self.get_client().map_err(TxError::Fatal)?;

        let mut transaction = client.begin_transaction().await.map_err(|e| {
            TxError::Contention(AppError::Database(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        // Read the user within the transaction; this registers the document
        // for conflict detection.
        let user: Option<User> = client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                TxError::Fatal(AppError::Database(format!(
                    "Failed to read user in transaction: {}",
                    e
                )))
            })?;

        let Some(mut user) = user else {
            let _ = transaction.rollback().await;
            return Err(TxError::Fatal(AppError::NotFound(format!(
                "User {} not found",
                user_id
            ))));
        };

        user.coins = match apply_coin_action(user.coins, action, amount) {
            Ok(balance) => balance,
            Err(e) => {
                // Validation or insufficient funds: nothing written
                let _ = transaction.rollback().await;
                return Err(TxError::Fatal(e));
            }
        };

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                TxError::Fatal(AppError::Database(format!(
                    "Failed to add user to transaction: {}",
                    e
                )))
            })?;

        transaction.commit().await.map_err(|e| {
            TxError::Contention(AppError::Database(format!(
                "Transaction commit failed: {}",
                e
            )))
        })?;

        Ok(user.coins)
    }

    /// Apply a ledger operation to every user, with bounded concurrency.
    ///
    /// Each user's adjustment is its own transaction; a failure for one
    /// user aborts the sweep. Returns the number of users updated.
    pub async fn adjust_coins_all(
        &self,
        action: CoinAction,
        amount: u32,
    ) -> Result<usize, AppError> {
        let users = self.list_users().await?;
        let count = users.len();

        stream::iter(users)
            .map(|user| async move { self.adjust_coins(&user.id, action, amount).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<u32, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<u32>, AppError>>()?;

        Ok(count)
    }

    /// Atomically debit `cost` coins and persist the recovered entries.
    ///
    /// Either the debit and every record commit together, or nothing does:
    /// the balance check, the user write, and the activity writes are one
    /// Firestore transaction. Concurrent recoveries for the same user
    /// serialize on the user document, so two requests can never both pass
    /// the sufficiency check against the same balance; the loser retries
    /// against the post-debit balance and fails with `InsufficientCoins`.
    ///
    /// Returns the new balance.
    pub async fn recover_days(
        &self,
        user_id: &str,
        cost: u32,
        records: &[Activity],
    ) -> Result<u32, AppError> {
        let mut last_err = None;
        for attempt in 1..=TRANSACTION_ATTEMPTS {
            match self.try_recover_days(user_id, cost, records).await {
                Ok(balance) => {
                    tracing::info!(
                        user_id,
                        cost,
                        records = records.len(),
                        balance,
                        "Recovery committed atomically"
                    );
                    return Ok(balance);
                }
                Err(TxError::Fatal(e)) => return Err(e),
                Err(TxError::Contention(e)) => {
                    tracing::warn!(user_id, attempt, error = %e, "Recovery transaction contention, retrying");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| AppError::Database("Transaction retries exhausted".to_string())))
    }

    async fn try_recover_days(
        &self,
        user_id: &str,
        cost: u32,
        records: &[Activity],
    ) -> Result<u32, TxError> {
        let client = self.get_client().map_err(TxError::Fatal)?;

        let mut transaction = client.begin_transaction().await.map_err(|e| {
            TxError::Contention(AppError::Database(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        // Read the user within the transaction; this registers the document
        // for conflict detection.
        let user: Option<User> = client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| {
                TxError::Fatal(AppError::Database(format!(
                    "Failed to read user in transaction: {}",
                    e
                )))
            })?;

        let Some(mut user) = user else {
            let _ = transaction.rollback().await;
            return Err(TxError::Fatal(AppError::NotFound(format!(
                "User {} not found",
                user_id
            ))));
        };

        if user.coins < cost {
            let _ = transaction.rollback().await;
            return Err(TxError::Fatal(AppError::InsufficientCoins {
                balance: user.coins,
                required: cost,
            }));
        }
        user.coins -= cost;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                TxError::Fatal(AppError::Database(format!(
                    "Failed to add user to transaction: {}",
                    e
                )))
            })?;

        for record in records {
            client
                .fluent()
                .update()
                .in_col(collections::ACTIVITIES)
                .document_id(&record.id)
                .object(record)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    TxError::Fatal(AppError::Database(format!(
                        "Failed to add recovered entry to transaction: {}",
                        e
                    )))
                })?;
        }

        transaction.commit().await.map_err(|e| {
            TxError::Contention(AppError::Database(format!(
                "Transaction commit failed: {}",
                e
            )))
        })?;

        Ok(user.coins)
    }
}

/// How a transaction attempt failed: `Fatal` errors roll back and surface
/// immediately; `Contention` errors (lost commit races) are retried.
enum TxError {
    Fatal(AppError),
    Contention(AppError),
}
