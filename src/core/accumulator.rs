//! Balance accumulator
//!
//! Applies reward credits from completed ad views to a user ledger:
//! the points counter grows by the credited units and the withdrawable
//! balance grows by `units × rate_per_point`.
//!
//! # Idempotency
//!
//! Ad-SDK completion callbacks carry no at-most-once guarantee and have been
//! observed to fire twice for one view. Callers that can attribute a credit
//! to an ad-view session pass its key; a replayed key leaves the ledger
//! untouched and reports [`CreditOutcome::Duplicate`]. Credits without a key
//! are applied unconditionally.

use rust_decimal::Decimal;

use crate::types::{LedgerEvent, RewardsError, UserId, UserLedger};

/// Result of applying a reward credit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    /// The ledger was updated
    Applied,
    /// The idempotency key was already seen; nothing changed
    Duplicate,
}

/// Applies reward credits to user ledgers under the configured conversion rate
#[derive(Debug, Clone)]
pub struct BalanceAccumulator {
    /// Currency credited per reward unit
    rate_per_point: Decimal,
}

impl BalanceAccumulator {
    /// Create an accumulator with the given conversion rate
    pub fn new(rate_per_point: Decimal) -> Self {
        BalanceAccumulator { rate_per_point }
    }

    /// The configured conversion rate
    pub fn rate_per_point(&self) -> Decimal {
        self.rate_per_point
    }

    /// Credit `units` reward units to the ledger
    ///
    /// Increments `points` by `units`, adds `units × rate_per_point` to the
    /// balance, and prepends one `earn` history event. All arithmetic is
    /// checked; on error the ledger is unchanged.
    ///
    /// # Arguments
    ///
    /// * `user` - Identity the ledger belongs to (error context only)
    /// * `ledger` - The ledger to credit
    /// * `units` - Number of reward units, must be positive
    /// * `dedup_key` - Optional ad-view session key for replay suppression
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnits` for `units == 0` and `ArithmeticOverflow` when
    /// the points counter or balance would overflow.
    pub fn credit(
        &self,
        user: &UserId,
        ledger: &mut UserLedger,
        units: u32,
        dedup_key: Option<&str>,
    ) -> Result<CreditOutcome, RewardsError> {
        if units == 0 {
            return Err(RewardsError::InvalidUnits);
        }

        if let Some(key) = dedup_key {
            if ledger.has_seen_credit(key) {
                return Ok(CreditOutcome::Duplicate);
            }
        }

        let new_points = ledger
            .points
            .checked_add(u64::from(units))
            .ok_or_else(|| RewardsError::arithmetic_overflow("credit", user.clone()))?;

        let earned = self
            .rate_per_point
            .checked_mul(Decimal::from(units))
            .ok_or_else(|| RewardsError::arithmetic_overflow("credit", user.clone()))?;

        let new_balance = ledger
            .balance
            .checked_add(earned)
            .ok_or_else(|| RewardsError::arithmetic_overflow("credit", user.clone()))?;

        // All checks passed; apply the credit
        ledger.points = new_points;
        ledger.balance = new_balance;
        ledger.push_event(LedgerEvent::earn(format!("+{} Point(s) from Ad", units)));

        if let Some(key) = dedup_key {
            ledger.remember_credit(key);
        }

        Ok(CreditOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LedgerEventKind;
    use rstest::rstest;

    fn accumulator() -> BalanceAccumulator {
        BalanceAccumulator::new(Decimal::new(5, 2)) // 0.05 per point
    }

    #[test]
    fn test_credit_increments_points_and_balance() {
        let user = UserId::from("1");
        let mut ledger = UserLedger::new();

        let outcome = accumulator().credit(&user, &mut ledger, 1, None).unwrap();

        assert_eq!(outcome, CreditOutcome::Applied);
        assert_eq!(ledger.points, 1);
        assert_eq!(ledger.balance, Decimal::new(5, 2));
    }

    #[test]
    fn test_credit_appends_one_earn_event_at_front() {
        let user = UserId::from("1");
        let mut ledger = UserLedger::new();
        ledger.push_event(LedgerEvent::withdraw("Request for $0.30"));

        accumulator().credit(&user, &mut ledger, 2, None).unwrap();

        assert_eq!(ledger.history_log.len(), 2);
        assert_eq!(ledger.history_log[0].kind, LedgerEventKind::Earn);
        assert_eq!(ledger.history_log[0].detail, "+2 Point(s) from Ad");
    }

    #[rstest]
    #[case::single_unit(1, 1, Decimal::new(5, 2))]
    #[case::several_units(5, 5, Decimal::new(25, 2))]
    #[case::repeated_application(1, 3, Decimal::new(15, 2))]
    fn test_credit_accumulates(
        #[case] units: u32,
        #[case] times: u64,
        #[case] expected_balance: Decimal,
    ) {
        let user = UserId::from("1");
        let mut ledger = UserLedger::new();
        let acc = accumulator();

        for _ in 0..times {
            acc.credit(&user, &mut ledger, units, None).unwrap();
        }

        assert_eq!(ledger.points, u64::from(units) * times);
        assert_eq!(ledger.balance, expected_balance);
    }

    #[test]
    fn test_credit_zero_units_fails() {
        let user = UserId::from("1");
        let mut ledger = UserLedger::new();

        let result = accumulator().credit(&user, &mut ledger, 0, None);

        assert_eq!(result.unwrap_err(), RewardsError::InvalidUnits);
        assert_eq!(ledger.points, 0);
        assert!(ledger.history_log.is_empty());
    }

    #[test]
    fn test_credit_with_replayed_key_is_noop() {
        let user = UserId::from("1");
        let mut ledger = UserLedger::new();
        let acc = accumulator();

        acc.credit(&user, &mut ledger, 1, Some("ad-session-9"))
            .unwrap();
        let outcome = acc
            .credit(&user, &mut ledger, 1, Some("ad-session-9"))
            .unwrap();

        assert_eq!(outcome, CreditOutcome::Duplicate);
        assert_eq!(ledger.points, 1);
        assert_eq!(ledger.balance, Decimal::new(5, 2));
        assert_eq!(ledger.history_log.len(), 1);
    }

    #[test]
    fn test_credit_with_distinct_keys_applies_both() {
        let user = UserId::from("1");
        let mut ledger = UserLedger::new();
        let acc = accumulator();

        acc.credit(&user, &mut ledger, 1, Some("ad-session-1"))
            .unwrap();
        acc.credit(&user, &mut ledger, 1, Some("ad-session-2"))
            .unwrap();

        assert_eq!(ledger.points, 2);
    }

    #[test]
    fn test_credit_points_overflow_leaves_ledger_unchanged() {
        let user = UserId::from("1");
        let mut ledger = UserLedger::new();
        ledger.points = u64::MAX;

        let result = accumulator().credit(&user, &mut ledger, 1, None);

        assert!(matches!(
            result.unwrap_err(),
            RewardsError::ArithmeticOverflow { .. }
        ));
        assert_eq!(ledger.points, u64::MAX);
        assert_eq!(ledger.balance, Decimal::ZERO);
        assert!(ledger.history_log.is_empty());
    }
}
