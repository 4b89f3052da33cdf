//! Rewards Engine Library
//! # Overview
//!
//! This library implements a rewards-accrual service: users earn points and
//! balance by completing ad views, and cash out through withdrawal requests
//! that an administrator approves or rejects.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (UserLedger, WithdrawalRequest, etc.)
//! - [`config`] - Runtime configuration and injected credentials
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Business logic components:
//!   - [`core::ledger_store`] - Durable persistence and per-user concurrency
//!   - [`core::accumulator`] - Reward credit application
//!   - [`core::settlement`] - Withdrawal log and paid-total aggregate
//!   - [`core::engine`] - Operation orchestration
//!   - [`core::stats`] - Admin summary aggregation
//!   - [`core::sync`] - Client/server ledger reconciliation
//! - [`notify`] - Fire-and-forget admin chat notifications
//! - [`http`] - The JSON API consumed by the presentation layer
//!
//! # Withdrawal Lifecycle
//!
//! A request starts `pending` with the amount reserved from the user's
//! balance. It transitions exactly once:
//!
//! - **Approve**: the cumulative paid total grows by the amount, in the
//!   same critical section as the status change
//! - **Reject**: the reserved amount is refunded to the user's balance
//!
//! Terminal states are immutable; a second decision is an error.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod http;
pub mod notify;
pub mod types;

pub use config::{EngineConfig, NotifyConfig};
pub use core::{
    AdminStats, BalanceAccumulator, ClientSession, LedgerStore, RemoteLedger, RewardsEngine,
};
pub use types::{
    LedgerEvent, RequestId, RewardsError, SettlementDecision, UserId, UserLedger,
    WithdrawalRequest, WithdrawalStatus,
};
