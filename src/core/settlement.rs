//! Withdrawal settlement log
//!
//! This module provides the `SettlementLog` component that maintains the
//! withdrawal-request history (newest first) together with the cumulative
//! paid total. The two live in one structure so that approving a request and
//! growing `total_paid` happen inside a single critical section: callers
//! wrap the log in a mutex and every settlement operation is both-or-neither.
//!
//! # Id Allocation
//!
//! Request ids are milliseconds since the Unix epoch at creation. Two
//! requests landing in the same millisecond would collide, so the allocator
//! bumps past the previously issued id; ids stay unique and strictly
//! monotonic.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::types::{RequestId, RewardsError, UserId, WithdrawalRequest, WithdrawalStatus};

/// Withdrawal-request log and paid-total aggregate
#[derive(Debug, Clone, Default)]
pub struct SettlementLog {
    /// Requests, newest first
    requests: Vec<WithdrawalRequest>,

    /// Cumulative sum of approved request amounts
    total_paid: Decimal,

    /// Floor for the next allocated request id
    last_id: RequestId,
}

impl SettlementLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted state
    ///
    /// The id floor is recovered from the largest persisted request id so
    /// restarts never reissue an id.
    pub fn from_parts(requests: Vec<WithdrawalRequest>, total_paid: Decimal) -> Self {
        let last_id = requests.iter().map(|request| request.id).max().unwrap_or(0);
        SettlementLog {
            requests,
            total_paid,
            last_id,
        }
    }

    /// Allocate the next request id
    fn allocate_id(&mut self) -> RequestId {
        let now = Utc::now().timestamp_millis();
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        id
    }

    /// Create a new pending request at the front of the log
    pub fn create(
        &mut self,
        username: String,
        user_id: UserId,
        amount: Decimal,
    ) -> WithdrawalRequest {
        let id = self.allocate_id();
        let request = WithdrawalRequest::new(id, username, user_id, amount);
        self.requests.insert(0, request.clone());
        request
    }

    /// Look up a request by id
    pub fn get(&self, id: RequestId) -> Result<&WithdrawalRequest, RewardsError> {
        self.requests
            .iter()
            .find(|request| request.id == id)
            .ok_or_else(|| RewardsError::request_not_found(id))
    }

    /// Approve a pending request and grow the paid total
    ///
    /// The new paid total is computed before the status flips so an overflow
    /// rejects the approval with the request still pending.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` for an unknown id, `InvalidTransition` for
    /// a request that already left `pending`, and `ArithmeticOverflow` if
    /// the paid total cannot absorb the amount.
    pub fn approve(&mut self, id: RequestId) -> Result<WithdrawalRequest, RewardsError> {
        let index = self.index_of(id)?;
        let request = &self.requests[index];

        if !request.is_pending() {
            return Err(RewardsError::invalid_transition(id, request.status));
        }

        let new_total = self
            .total_paid
            .checked_add(request.amount)
            .ok_or_else(|| {
                RewardsError::arithmetic_overflow("total_paid", request.user_id.clone())
            })?;

        let request = &mut self.requests[index];
        request.status = WithdrawalStatus::Approved;
        self.total_paid = new_total;

        Ok(request.clone())
    }

    /// Reject a pending request
    ///
    /// The paid total is untouched; the caller refunds the reserved amount
    /// to the requester's ledger.
    pub fn reject(&mut self, id: RequestId) -> Result<WithdrawalRequest, RewardsError> {
        let index = self.index_of(id)?;
        let request = &mut self.requests[index];
        request.transition(WithdrawalStatus::Rejected)?;
        Ok(request.clone())
    }

    /// Whether the user has a request still awaiting a decision
    pub fn has_pending_for(&self, user: &UserId) -> bool {
        self.requests
            .iter()
            .any(|request| request.is_pending() && &request.user_id == user)
    }

    /// Number of requests still awaiting a decision
    pub fn pending_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|request| request.is_pending())
            .count()
    }

    /// Cumulative sum of approved request amounts
    pub fn total_paid(&self) -> Decimal {
        self.total_paid
    }

    /// All requests, newest first
    pub fn requests(&self) -> &[WithdrawalRequest] {
        &self.requests
    }

    fn index_of(&self, id: RequestId) -> Result<usize, RewardsError> {
        self.requests
            .iter()
            .position(|request| request.id == id)
            .ok_or_else(|| RewardsError::request_not_found(id))
    }
}
