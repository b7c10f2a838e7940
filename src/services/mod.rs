// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ledger;
pub mod recovery;

pub use ledger::{apply_coin_action, CoinAction};
pub use recovery::{recover_days, RecoveryOutcome, COINS_PER_RECOVERED_DAY};
