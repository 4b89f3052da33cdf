//! Admin summary statistics
//!
//! Read-only aggregation over the ledger store: distinct user count,
//! undecided withdrawal requests, and the cumulative paid total. Computed
//! per request, no caching; reads run concurrently with writes and may be
//! slightly stale, which is accepted over blocking writers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::RewardsError;

use super::ledger_store::LedgerStore;

/// Summary statistics for the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    /// Count of distinct user ledgers
    pub total_users: usize,

    /// Count of requests with status `pending`
    pub pending_withdrawals: usize,

    /// Cumulative sum of approved request amounts
    pub total_paid: Decimal,
}

/// Derive the current summary from the store
pub fn compute_stats(store: &LedgerStore) -> Result<AdminStats, RewardsError> {
    Ok(AdminStats {
        total_users: store.user_count(),
        pending_withdrawals: store.pending_count()?,
        total_paid: store.total_paid()?,
    })
}
