// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coin ledger arithmetic.
//!
//! The functions here are pure; atomicity is provided by the database
//! layer, which applies them inside a Firestore transaction on the user
//! document (see `FirestoreDb::adjust_coins`).

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Requested ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinAction {
    /// Credit the balance
    Add,
    /// Debit, flooring at zero (never fails)
    Remove,
    /// Debit, failing if the balance is insufficient
    Spend,
}

/// Apply a ledger operation to a balance, returning the new balance.
///
/// `amount` must be positive; `Spend` fails with `InsufficientCoins` and
/// leaves the balance untouched. `Remove` is a saturating subtraction: the
/// truncation to zero is intentional, not an error.
pub fn apply_coin_action(balance: u32, action: CoinAction, amount: u32) -> Result<u32, AppError> {
    if amount == 0 {
        return Err(AppError::BadRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }

    match action {
        CoinAction::Add => Ok(balance.saturating_add(amount)),
        CoinAction::Remove => Ok(balance.saturating_sub(amount)),
        CoinAction::Spend => {
            if balance < amount {
                Err(AppError::InsufficientCoins {
                    balance,
                    required: amount,
                })
            } else {
                Ok(balance - amount)
            }
        }
    }
}
