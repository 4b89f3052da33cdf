//! Core business logic module
//!
//! This module contains the core rewards processing components:
//! - `accumulator` - Reward credit application and replay suppression
//! - `engine` - Operation orchestration over store and notifier
//! - `ledger_store` - Durable persistence and per-user concurrency control
//! - `settlement` - Withdrawal-request log and paid-total aggregate
//! - `stats` - Admin summary aggregation
//! - `sync` - Client/server ledger reconciliation

pub mod accumulator;
pub mod engine;
pub mod ledger_store;
pub mod settlement;
pub mod stats;
pub mod sync;

pub use accumulator::{BalanceAccumulator, CreditOutcome};
pub use engine::RewardsEngine;
pub use ledger_store::{LedgerDocument, LedgerStore};
pub use settlement::SettlementLog;
pub use stats::{compute_stats, AdminStats};
pub use sync::{ClientSession, RemoteLedger};
