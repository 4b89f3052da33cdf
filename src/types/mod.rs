//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `ledger`: Per-user ledger records and history events
//! - `withdrawal`: Withdrawal requests and their status state machine
//! - `error`: Error types for the rewards engine

pub mod error;
pub mod ledger;
pub mod withdrawal;

pub use error::RewardsError;
pub use ledger::{LedgerEvent, LedgerEventKind, UserId, UserLedger, DEDUP_CAP, HISTORY_CAP};
pub use withdrawal::{
    RequestId, SettlementDecision, WithdrawalRequest, WithdrawalStatus,
};
