//! Rewards processing engine
//!
//! This module provides the `RewardsEngine` that orchestrates the ledger
//! store, the balance accumulator, and the admin notifier. It enforces the
//! business rules the HTTP surface relies on:
//! - reward credits use checked arithmetic and optional replay suppression
//! - withdrawal requests must meet the configured minimum and reserve the
//!   requested amount from the balance
//! - settlements apply exactly once; rejection refunds the reservation
//! - admin notices are fire-and-forget and never roll back a transition
//! - every mutation is followed by a best-effort persistence pass

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::notify::{self, Notifier};
use crate::types::{
    RequestId, RewardsError, SettlementDecision, UserId, UserLedger, WithdrawalRequest,
};

use super::accumulator::{BalanceAccumulator, CreditOutcome};
use super::ledger_store::LedgerStore;
use super::stats::{compute_stats, AdminStats};

/// Extract a display name from a chat-platform identity string
///
/// Identities arrive as free-form strings like `"@alice (ID: 42)"`; the
/// first token, stripped of its `@`, is the display name. Anything unusable
/// becomes `"Unknown"`.
pub fn parse_username(user_info: Option<&str>) -> String {
    let Some(info) = user_info else {
        return "Unknown".to_string();
    };
    let name = info
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_start_matches('@');
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}

/// Orchestrates rewards accrual and withdrawal settlement
pub struct RewardsEngine {
    store: Arc<LedgerStore>,
    accumulator: BalanceAccumulator,
    config: EngineConfig,
    notifier: Arc<dyn Notifier>,
}

impl RewardsEngine {
    /// Create an engine over the given store and notifier
    pub fn new(store: Arc<LedgerStore>, config: EngineConfig, notifier: Arc<dyn Notifier>) -> Self {
        RewardsEngine {
            accumulator: BalanceAccumulator::new(config.rate_per_point),
            store,
            config,
            notifier,
        }
    }

    /// The underlying ledger store
    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Credit reward units from a completed ad view
    ///
    /// Applies the credit atomically for the user and returns the updated
    /// ledger. A replayed `dedup_key` leaves the ledger unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnits` for zero units and `ArithmeticOverflow` when
    /// the ledger cannot absorb the credit; the ledger is untouched on error.
    pub async fn credit(
        &self,
        user: &UserId,
        units: u32,
        dedup_key: Option<&str>,
    ) -> Result<UserLedger, RewardsError> {
        let mut outcome = CreditOutcome::Applied;
        let ledger = self.store.update_user(user, |ledger| {
            outcome = self.accumulator.credit(user, ledger, units, dedup_key)?;
            Ok(())
        })?;

        if outcome == CreditOutcome::Duplicate {
            debug!("duplicate reward credit ignored for user {user}");
        } else {
            self.store.persist().await;
        }

        Ok(ledger)
    }

    /// Current ledger for a user, zeroed default when unknown
    pub fn user_snapshot(&self, user: &UserId) -> UserLedger {
        self.store.load_user(user)
    }

    /// Client write-through of a locally accrued ledger
    pub async fn save_user(&self, user: &UserId, ledger: UserLedger) {
        self.store.save_user(user, ledger);
        self.store.persist().await;
    }

    /// File a withdrawal request for `amount`
    ///
    /// Validates the identity and the configured minimum, then reserves the
    /// amount from the balance and records the pending request. The admin is
    /// notified fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns `MalformedIdentity`, `BelowMinimum`, `InsufficientBalance`,
    /// or `PendingRequestExists`; the user's balance is unchanged on every
    /// error path.
    pub async fn request_withdrawal(
        &self,
        user: &UserId,
        user_info: Option<&str>,
        amount: Decimal,
    ) -> Result<WithdrawalRequest, RewardsError> {
        if user.is_empty() {
            return Err(RewardsError::malformed_identity("missing user id"));
        }
        if amount < self.config.min_withdrawal {
            return Err(RewardsError::below_minimum(
                self.config.min_withdrawal,
                amount,
            ));
        }

        let username = parse_username(user_info);
        let request = self.store.create_request(user, username, amount)?;

        self.notify_admin(notify::withdrawal_requested(&request));
        self.store.persist().await;

        Ok(request)
    }

    /// Apply an admin decision to a pending request
    ///
    /// Approval grows the paid total atomically with the status change;
    /// rejection refunds the reserved amount. The admin is notified
    /// fire-and-forget either way.
    pub async fn settle(
        &self,
        id: RequestId,
        decision: SettlementDecision,
    ) -> Result<WithdrawalRequest, RewardsError> {
        let request = self.store.settle(id, decision)?;

        self.notify_admin(notify::withdrawal_settled(&request));
        self.store.persist().await;

        Ok(request)
    }

    /// Summary statistics for the admin dashboard
    pub fn admin_stats(&self) -> Result<AdminStats, RewardsError> {
        compute_stats(&self.store)
    }

    /// All withdrawal requests, newest first
    pub fn withdrawals(&self) -> Result<Vec<WithdrawalRequest>, RewardsError> {
        self.store.withdrawal_requests()
    }

    /// Dispatch an admin notice without waiting on delivery
    fn notify_admin(&self, text: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(&text).await {
                warn!("admin notification failed: {err}");
            }
        });
    }
}
