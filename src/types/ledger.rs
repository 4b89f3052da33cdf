//! Ledger-related types for the rewards engine
//!
//! This module defines the per-user ledger record and its history events,
//! along with the balance operations (credit, reserve, refund) used by the
//! accumulator and the withdrawal lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::RewardsError;

/// Maximum number of history events retained per user
///
/// When a new event is prepended and the log exceeds this cap, the oldest
/// entry is evicted from the tail.
pub const HISTORY_CAP: usize = 50;

/// Maximum number of remembered reward-credit idempotency keys per user
///
/// Ad-view completion callbacks can fire more than once; replays of a
/// remembered key are ignored. Oldest keys are evicted first.
pub const DEDUP_CAP: usize = 64;

/// Stable external user identity
///
/// Chat-platform identities arrive as opaque strings; the engine never
/// interprets them beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        UserId(value)
    }
}

impl UserId {
    /// Whether the identity carries any usable content
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Kind of a ledger history event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEventKind {
    /// Points/balance credited from a completed ad view
    Earn,
    /// A withdrawal request was filed against the balance
    Withdraw,
}

/// A single immutable entry in a user's history log
///
/// Events are created by the balance accumulator (`earn`) or the withdrawal
/// lifecycle (`withdraw`) and are never mutated afterwards; they only leave
/// the log through the [`HISTORY_CAP`] eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Event kind (wire name `type`)
    #[serde(rename = "type")]
    pub kind: LedgerEventKind,

    /// Human-readable description shown in the client history view
    pub detail: String,

    /// Creation time, immutable
    pub timestamp: DateTime<Utc>,
}

impl LedgerEvent {
    /// Create an `earn` event stamped with the current time
    pub fn earn(detail: impl Into<String>) -> Self {
        LedgerEvent {
            kind: LedgerEventKind::Earn,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a `withdraw` event stamped with the current time
    pub fn withdraw(detail: impl Into<String>) -> Self {
        LedgerEvent {
            kind: LedgerEventKind::Withdraw,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-user ledger record
///
/// Tracks the lifetime points counter, the withdrawable balance, and the
/// capped history log. `points` is monotonic (it is a lifetime earn counter
/// and leaderboard score); `balance` is reduced when a withdrawal request
/// reserves it and restored when a request is rejected.
///
/// Invariants: `balance` is never negative, `history_log.len() <= HISTORY_CAP`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserLedger {
    /// Lifetime reward units earned
    pub points: u64,

    /// Withdrawable currency amount
    pub balance: Decimal,

    /// History events, newest first, capped at [`HISTORY_CAP`]
    pub history_log: Vec<LedgerEvent>,

    /// Recently applied reward-credit idempotency keys, oldest first
    ///
    /// Not part of the client-facing state; omitted from serialized output
    /// while empty so a fresh record round-trips as `{points, balance,
    /// historyLog}`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seen_credits: Vec<String>,
}

impl UserLedger {
    /// Create a zeroed ledger for a first-seen user
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a history event, evicting the oldest entry past [`HISTORY_CAP`]
    pub fn push_event(&mut self, event: LedgerEvent) {
        self.history_log.insert(0, event);
        self.history_log.truncate(HISTORY_CAP);
    }

    /// Whether a reward-credit idempotency key has already been applied
    pub fn has_seen_credit(&self, key: &str) -> bool {
        self.seen_credits.iter().any(|seen| seen == key)
    }

    /// Remember a reward-credit idempotency key, evicting past [`DEDUP_CAP`]
    pub fn remember_credit(&mut self, key: &str) {
        if self.seen_credits.len() >= DEDUP_CAP {
            self.seen_credits.remove(0);
        }
        self.seen_credits.push(key.to_string());
    }

    /// Reserve `amount` out of the balance for a withdrawal request
    ///
    /// The reserved amount is held by the pending request itself: it is paid
    /// out on approval and refunded on rejection.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` when the balance does not cover the
    /// amount; the ledger is unchanged on error.
    pub fn reserve(&mut self, user: &UserId, amount: Decimal) -> Result<(), RewardsError> {
        if self.balance < amount {
            return Err(RewardsError::insufficient_balance(
                user.clone(),
                self.balance,
                amount,
            ));
        }

        let new_balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| RewardsError::arithmetic_overflow("reserve", user.clone()))?;

        self.balance = new_balance;
        Ok(())
    }

    /// Restore a previously reserved `amount` to the balance
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the addition would overflow; the
    /// ledger is unchanged on error.
    pub fn refund(&mut self, user: &UserId, amount: Decimal) -> Result<(), RewardsError> {
        let new_balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| RewardsError::arithmetic_overflow("refund", user.clone()))?;

        self.balance = new_balance;
        Ok(())
    }
}
