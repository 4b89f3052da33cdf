//! Withdrawal-request types for the rewards engine
//!
//! This module defines the withdrawal request record and its status state
//! machine: `pending` at creation, transitioning exactly once to `approved`
//! or `rejected`.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::RewardsError;
use super::ledger::UserId;

/// Withdrawal request identifier
///
/// Milliseconds since the Unix epoch at creation, bumped past the previously
/// issued id so ids stay unique and strictly monotonic under concurrency.
pub type RequestId = i64;

/// Lifecycle status of a withdrawal request
///
/// `Pending` is the only non-terminal state. `Approved` and `Rejected` are
/// terminal: once a request leaves `Pending` it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Administrator decision on a pending withdrawal request
///
/// Modeled separately from [`WithdrawalStatus`] so that the transition API
/// cannot be asked to move a request back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementDecision {
    Approve,
    Reject,
}

impl SettlementDecision {
    /// The terminal status this decision resolves to
    pub fn target_status(self) -> WithdrawalStatus {
        match self {
            SettlementDecision::Approve => WithdrawalStatus::Approved,
            SettlementDecision::Reject => WithdrawalStatus::Rejected,
        }
    }
}

/// A user-initiated claim to cash out balance, subject to admin approval
///
/// `username` and `user_id` are snapshots of the requester identity at
/// creation time; they are not live-linked to the user ledger. `amount` is
/// the balance reserved when the request was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    /// Unique, monotonic identifier assigned at creation
    pub id: RequestId,

    /// Requester display name parsed from the chat-platform identity
    pub username: String,

    /// Requester identity snapshot
    pub user_id: UserId,

    /// Amount reserved from the requester's balance
    pub amount: Decimal,

    /// Creation time
    pub timestamp: DateTime<Utc>,

    /// Current lifecycle status
    pub status: WithdrawalStatus,
}

impl WithdrawalRequest {
    /// Create a new pending request stamped with the current time
    pub fn new(id: RequestId, username: String, user_id: UserId, amount: Decimal) -> Self {
        WithdrawalRequest {
            id,
            username,
            user_id,
            amount,
            timestamp: Utc::now(),
            status: WithdrawalStatus::Pending,
        }
    }

    /// Whether the request is still awaiting an admin decision
    pub fn is_pending(&self) -> bool {
        self.status == WithdrawalStatus::Pending
    }

    /// Move the request to a terminal status
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the request already left `pending`,
    /// or if the target is `pending` itself.
    pub fn transition(&mut self, target: WithdrawalStatus) -> Result<(), RewardsError> {
        if !self.is_pending() || target == WithdrawalStatus::Pending {
            return Err(RewardsError::invalid_transition(self.id, self.status));
        }
        self.status = target;
        Ok(())
    }
}
