//! Error types for the rewards engine
//!
//! This module defines all error types that can occur while crediting
//! rewards, filing withdrawal requests, and settling them.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: unknown withdrawal request id
//! - **Transition Errors**: decision targeted at a non-pending request
//! - **Validation Errors**: amount below minimum, insufficient balance,
//!   malformed identity, duplicate pending request
//! - **Arithmetic Errors**: overflow in balance or paid-total calculations
//! - **Infrastructure Errors**: persistence backend unreachable (degrade,
//!   don't crash), notification delivery failure (logged only)

use rust_decimal::Decimal;
use thiserror::Error;

use super::ledger::UserId;
use super::withdrawal::{RequestId, WithdrawalStatus};

/// Main error type for the rewards engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RewardsError {
    /// No withdrawal request exists with the given id
    ///
    /// This is a recoverable error - the admin action is rejected and
    /// nothing changes.
    #[error("Withdrawal request {request} not found")]
    RequestNotFound {
        /// The request id that was not found
        request: RequestId,
    },

    /// The targeted request already left the `pending` state
    ///
    /// Terminal statuses are immutable; the duplicate decision is rejected.
    #[error("Withdrawal request {request} is already {status}")]
    InvalidTransition {
        /// The request id that was targeted
        request: RequestId,
        /// The terminal status the request is in
        status: WithdrawalStatus,
    },

    /// Requested amount is below the configured withdrawal minimum
    #[error("Minimum withdrawal amount is {minimum}, requested {requested}")]
    BelowMinimum {
        /// The configured minimum
        minimum: Decimal,
        /// The amount that was requested
        requested: Decimal,
    },

    /// The user's balance does not cover the requested amount
    ///
    /// The withdrawal is rejected and the balance remains unchanged.
    #[error("Insufficient balance for user {user}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// User whose balance was checked
        user: UserId,
        /// Current balance
        balance: Decimal,
        /// Requested withdrawal amount
        requested: Decimal,
    },

    /// The user already has a request awaiting an admin decision
    #[error("User {user} already has a pending withdrawal request")]
    PendingRequestExists {
        /// User who filed the duplicate request
        user: UserId,
    },

    /// The caller-supplied identity cannot be used
    #[error("Malformed identity: {message}")]
    MalformedIdentity {
        /// Description of what was wrong
        message: String,
    },

    /// Reward units must be a positive integer
    #[error("Reward units must be positive")]
    InvalidUnits,

    /// Arithmetic overflow would occur
    ///
    /// The operation is rejected to keep the ledger consistent.
    #[error("Arithmetic overflow in {operation} for user {user}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// User the operation was applied to
        user: UserId,
    },

    /// Persistence backend is unreachable or corrupt
    ///
    /// Callers degrade to cached or default state instead of failing.
    #[error("Store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the failure
        message: String,
    },

    /// Admin notification could not be delivered
    ///
    /// Never rolls back the state change it was reporting; logged only.
    #[error("Notification failed: {message}")]
    NotificationFailure {
        /// Description of the failure
        message: String,
    },
}

impl From<std::io::Error> for RewardsError {
    fn from(error: std::io::Error) -> Self {
        RewardsError::StoreUnavailable {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for RewardsError {
    fn from(error: serde_json::Error) -> Self {
        RewardsError::StoreUnavailable {
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for RewardsError {
    fn from(error: reqwest::Error) -> Self {
        RewardsError::NotificationFailure {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl RewardsError {
    /// Create a RequestNotFound error
    pub fn request_not_found(request: RequestId) -> Self {
        RewardsError::RequestNotFound { request }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(request: RequestId, status: WithdrawalStatus) -> Self {
        RewardsError::InvalidTransition { request, status }
    }

    /// Create a BelowMinimum error
    pub fn below_minimum(minimum: Decimal, requested: Decimal) -> Self {
        RewardsError::BelowMinimum { minimum, requested }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user: UserId, balance: Decimal, requested: Decimal) -> Self {
        RewardsError::InsufficientBalance {
            user,
            balance,
            requested,
        }
    }

    /// Create a PendingRequestExists error
    pub fn pending_request_exists(user: UserId) -> Self {
        RewardsError::PendingRequestExists { user }
    }

    /// Create a MalformedIdentity error
    pub fn malformed_identity(message: &str) -> Self {
        RewardsError::MalformedIdentity {
            message: message.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user: UserId) -> Self {
        RewardsError::ArithmeticOverflow {
            operation: operation.to_string(),
            user,
        }
    }

    /// Create a StoreUnavailable error
    pub fn store_unavailable(message: &str) -> Self {
        RewardsError::StoreUnavailable {
            message: message.to_string(),
        }
    }

    /// Create a NotificationFailure error
    pub fn notification_failure(message: &str) -> Self {
        RewardsError::NotificationFailure {
            message: message.to_string(),
        }
    }

    /// Whether this error is a caller-input validation failure
    ///
    /// Validation failures surface to the caller as a rejected operation;
    /// infrastructure failures degrade instead.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RewardsError::BelowMinimum { .. }
                | RewardsError::InsufficientBalance { .. }
                | RewardsError::PendingRequestExists { .. }
                | RewardsError::MalformedIdentity { .. }
                | RewardsError::InvalidUnits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::request_not_found(
        RewardsError::RequestNotFound { request: 999 },
        "Withdrawal request 999 not found"
    )]
    #[case::invalid_transition(
        RewardsError::InvalidTransition { request: 7, status: WithdrawalStatus::Approved },
        "Withdrawal request 7 is already approved"
    )]
    #[case::below_minimum(
        RewardsError::BelowMinimum { minimum: Decimal::new(30, 2), requested: Decimal::new(10, 2) },
        "Minimum withdrawal amount is 0.30, requested 0.10"
    )]
    #[case::insufficient_balance(
        RewardsError::InsufficientBalance {
            user: UserId::from("42"),
            balance: Decimal::new(300, 2),
            requested: Decimal::new(500, 2),
        },
        "Insufficient balance for user 42: balance 3.00, requested 5.00"
    )]
    #[case::pending_exists(
        RewardsError::PendingRequestExists { user: UserId::from("42") },
        "User 42 already has a pending withdrawal request"
    )]
    #[case::malformed_identity(
        RewardsError::MalformedIdentity { message: "missing user id".to_string() },
        "Malformed identity: missing user id"
    )]
    #[case::invalid_units(RewardsError::InvalidUnits, "Reward units must be positive")]
    #[case::arithmetic_overflow(
        RewardsError::ArithmeticOverflow { operation: "credit".to_string(), user: UserId::from("1") },
        "Arithmetic overflow in credit for user 1"
    )]
    #[case::store_unavailable(
        RewardsError::StoreUnavailable { message: "disk full".to_string() },
        "Store unavailable: disk full"
    )]
    fn test_error_display(#[case] error: RewardsError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::below_minimum(RewardsError::below_minimum(Decimal::ONE, Decimal::ZERO), true)]
    #[case::pending_exists(RewardsError::pending_request_exists(UserId::from("1")), true)]
    #[case::not_found(RewardsError::request_not_found(1), false)]
    #[case::store(RewardsError::store_unavailable("down"), false)]
    fn test_is_validation(#[case] error: RewardsError, #[case] expected: bool) {
        assert_eq!(error.is_validation(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: RewardsError = io_error.into();
        assert!(matches!(error, RewardsError::StoreUnavailable { .. }));
        assert_eq!(error.to_string(), "Store unavailable: Permission denied");
    }
}
